use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tube_blob::{BlobError, BlobStore};
use tube_core::{ServiceCapabilities, ServiceMethodKind, TubeApp, TubeError};

use crate::services::TubeParams;

use super::videos_hooks::{AttachVideoUrl, ValidatePagination};

pub const OWNER: &str = "owner";
pub const UPLOAD: &str = "upload";
pub const REGISTER: &str = "register";
pub const VIEW: &str = "view";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Remove,
        ServiceMethodKind::Custom(OWNER),
        ServiceMethodKind::Custom(UPLOAD),
        ServiceMethodKind::Custom(REGISTER),
        ServiceMethodKind::Custom(VIEW),
    ])
}

pub fn register_hooks(app: &TubeApp<Value, TubeParams>, blobs: Arc<dyn BlobStore>) -> Result<()> {
    let paginate = Arc::new(ValidatePagination);
    let attach = Arc::new(AttachVideoUrl::new(blobs));

    app.service("videos")?.hooks(|h| {
        h.before_find(paginate.clone());
        h.before(ServiceMethodKind::Custom(OWNER), paginate);

        h.after_find(attach.clone());
        h.after_get(attach.clone());
        h.after(ServiceMethodKind::Custom(OWNER), attach.clone());
        h.after(ServiceMethodKind::Custom(REGISTER), attach);
    });

    Ok(())
}

/// Unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Map a blob store failure onto the status the caller should see.
pub fn blob_failure(err: BlobError, action: &str) -> anyhow::Error {
    let tube = match err {
        BlobError::NotFound { .. } => TubeError::not_found(err.to_string()),
        BlobError::Invalid { .. } => TubeError::bad_request(err.to_string()),
        e if e.is_upstream() => TubeError::bad_gateway(format!("{action} failed: {e}")).with_source(e),
        e => TubeError::general_error(format!("{action} failed")).with_source(e),
    };
    tube.into_anyhow()
}
