pub mod multipart;

pub use multipart::{MultipartConfig, MultipartToJson, MultipartToJsonService, UploadedFile};
