use std::sync::Arc;

use serde_json::Value;
use tube_core::{TubeApp, TubeService};

pub mod adapters;
pub mod platform;
pub mod types;
pub mod users;
pub mod videos;

pub use types::TubeParams;

use crate::Backends;

pub struct TubeServices {
    pub videos: Arc<dyn TubeService<Value, TubeParams>>,
    pub users: Arc<dyn TubeService<Value, TubeParams>>,
    pub platform: Arc<dyn TubeService<Value, TubeParams>>,
}

pub fn configure(app: &TubeApp<Value, TubeParams>, backends: &Backends) -> anyhow::Result<TubeServices> {
    let videos: Arc<dyn TubeService<Value, TubeParams>> = Arc::new(videos::VideosService::new(
        Arc::clone(&backends.registry),
        Arc::clone(&backends.chain),
        Arc::clone(&backends.blobs),
    ));
    let users: Arc<dyn TubeService<Value, TubeParams>> =
        Arc::new(users::UsersService::new(Arc::clone(&backends.chain)));
    let platform: Arc<dyn TubeService<Value, TubeParams>> =
        Arc::new(platform::PlatformService::new(Arc::clone(&backends.chain)));

    app.register_service("videos", Arc::clone(&videos));
    app.register_service("users", Arc::clone(&users));
    app.register_service("platform", Arc::clone(&platform));

    videos::videos_shared::register_hooks(app, Arc::clone(&backends.blobs))?;

    Ok(TubeServices {
        videos,
        users,
        platform,
    })
}
