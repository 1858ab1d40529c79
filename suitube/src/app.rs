use anyhow::Result;
use serde_json::Value;
use tube_core::TubeApp;

use crate::services::TubeParams;

/// App with config loaded from the environment and global hooks installed.
pub fn suitube_app() -> Result<TubeApp<Value, TubeParams>> {
    let tube_app: TubeApp<Value, TubeParams> = TubeApp::new();
    crate::config::config(&tube_app)?;
    crate::hooks::global_hooks(&tube_app);
    Ok(tube_app)
}
