pub mod stream;
pub mod videos_hooks;
pub mod videos_params;
pub mod videos_service;
pub mod videos_shared;

pub use videos_params::{ListParams, RegisterParams, UploadParts};
pub use videos_service::VideosService;
