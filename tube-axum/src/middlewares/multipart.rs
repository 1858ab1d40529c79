//! Multipart uploads without buffering.
//!
//! [`MultipartToJson`] rewrites a `multipart/form-data` request into a JSON
//! request. File parts are streamed chunk by chunk into temp files and show
//! up in the JSON as [`UploadedFile`] references; text parts become strings.
//! Temp files live for one request: whatever is still on disk once the inner
//! service has answered is removed, whichever route or status it ended in.
//!
//! Any other request passes through untouched.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tower::{Layer, Service};
use tube_core::TubeError;

use crate::TubeAxumError;

/// A file part after it has been written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub temp_path: PathBuf,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

impl UploadedFile {
    /// Remove the temp file. Missing files are not an error.
    pub async fn discard(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.temp_path.display(), error = %e, "failed to remove temp upload");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Per-file limit in bytes (None = unlimited).
    pub max_file_size: Option<u64>,
    /// Accepted file content types. `video/*` style wildcards match a whole
    /// family. Empty accepts anything.
    pub allowed_content_types: HashSet<String>,
    /// Field names to treat as files (empty = any part with a filename).
    pub file_fields: HashSet<String>,
    pub upload_dir: PathBuf,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_file_size: Some(500 * 1024 * 1024),
            allowed_content_types: HashSet::new(),
            file_fields: HashSet::new(),
            upload_dir: std::env::temp_dir(),
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = Some(size);
        self
    }

    pub fn allow_content_type(mut self, content_type: &str) -> Self {
        self.allowed_content_types.insert(content_type.to_ascii_lowercase());
        self
    }

    pub fn file_field(mut self, field_name: &str) -> Self {
        self.file_fields.insert(field_name.to_string());
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    fn is_file_field(&self, name: &str, filename: Option<&str>) -> bool {
        if self.file_fields.is_empty() {
            filename.is_some()
        } else {
            self.file_fields.contains(name)
        }
    }

    fn content_type_allowed(&self, content_type: Option<&str>) -> bool {
        if self.allowed_content_types.is_empty() {
            return true;
        }
        let Some(ct) = content_type else {
            return false;
        };
        let ct = ct.to_ascii_lowercase();
        let essence = ct.split(';').next().unwrap_or("").trim();

        self.allowed_content_types.iter().any(|allowed| {
            match allowed.strip_suffix("/*") {
                Some(family) => essence
                    .split_once('/')
                    .map(|(top, _)| top == family)
                    .unwrap_or(false),
                None => allowed == essence,
            }
        })
    }
}

#[derive(Clone, Default)]
pub struct MultipartToJson {
    config: MultipartConfig,
}

impl MultipartToJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MultipartConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for MultipartToJson {
    type Service = MultipartToJsonService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MultipartToJsonService {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct MultipartToJsonService<S> {
    inner: S,
    config: MultipartConfig,
}

impl<S> Service<Request<Body>> for MultipartToJsonService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The clone is not ready; swap so the ready service handles this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();

        Box::pin(async move {
            let boundary = req
                .headers()
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .filter(|ct| ct.starts_with("multipart/form-data"))
                .and_then(|ct| multer::parse_boundary(ct).ok());

            let Some(boundary) = boundary else {
                return inner.call(req).await;
            };

            match convert_multipart_to_json(req, boundary, &config).await {
                Ok((json_req, written)) => {
                    let res = inner.call(json_req).await;
                    for file in &written {
                        file.discard().await;
                    }
                    res
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rejected multipart request");
                    Ok(TubeAxumError::from(e).into_response())
                }
            }
        })
    }
}

async fn convert_multipart_to_json(
    req: Request<Body>,
    boundary: String,
    config: &MultipartConfig,
) -> Result<(Request<Body>, Vec<UploadedFile>), TubeError> {
    let (mut parts, body) = req.into_parts();
    let mut multipart = multer::Multipart::new(body.into_data_stream(), boundary);

    let mut fields: HashMap<String, serde_json::Value> = HashMap::new();
    let mut written: Vec<UploadedFile> = Vec::new();

    let outcome = read_fields(&mut multipart, config, &mut fields, &mut written).await;
    if let Err(e) = outcome {
        for file in &written {
            file.discard().await;
        }
        return Err(e);
    }

    let json_bytes = match serde_json::to_vec(&fields) {
        Ok(bytes) => bytes,
        Err(e) => {
            for file in &written {
                file.discard().await;
            }
            return Err(TubeError::general_error(format!("Failed to encode multipart fields: {e}")));
        }
    };

    parts.headers.insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/json"),
    );
    parts.headers.insert(
        axum::http::header::CONTENT_LENGTH,
        axum::http::HeaderValue::from(json_bytes.len()),
    );

    tracing::debug!(fields = fields.len(), files = written.len(), "multipart converted to json");
    Ok((Request::from_parts(parts, Body::from(json_bytes)), written))
}

async fn read_fields(
    multipart: &mut multer::Multipart<'_>,
    config: &MultipartConfig,
    fields: &mut HashMap<String, serde_json::Value>,
    written: &mut Vec<UploadedFile>,
) -> Result<(), TubeError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("unknown").to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|ct| ct.to_string());

        if !config.is_file_field(&name, filename.as_deref()) {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, serde_json::Value::String(value));
            continue;
        }

        if !config.content_type_allowed(content_type.as_deref()) {
            return Err(TubeError::bad_request(format!(
                "Content type '{}' not allowed for field '{name}'",
                content_type.as_deref().unwrap_or("none")
            )));
        }

        let temp_path = temp_path_for(&config.upload_dir, &name);
        let size = match stream_to_file(field, &temp_path, config.max_file_size, &name).await {
            Ok(size) => size,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        let file = UploadedFile {
            temp_path,
            filename,
            content_type,
            size,
        };
        written.push(file.clone());

        tracing::debug!(field = %name, size, path = %file.temp_path.display(), "file part stored");
        let value = serde_json::to_value(&file)
            .map_err(|e| TubeError::general_error(format!("Failed to encode file part: {e}")))?;
        fields.insert(name, value);
    }

    Ok(())
}

async fn stream_to_file(
    mut field: multer::Field<'_>,
    path: &Path,
    max_size: Option<u64>,
    name: &str,
) -> Result<u64, TubeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    let mut out = tokio::fs::File::create(path).await.map_err(io_error)?;

    let mut total = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        total += chunk.len() as u64;
        if let Some(max) = max_size {
            if total > max {
                return Err(TubeError::payload_too_large(format!(
                    "File '{name}' exceeds maximum size of {max} bytes"
                )));
            }
        }
        out.write_all(&chunk).await.map_err(io_error)?;
    }
    out.flush().await.map_err(io_error)?;

    Ok(total)
}

fn temp_path_for(dir: &Path, field: &str) -> PathBuf {
    let safe: String = field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!("upload_{}_{safe}", uuid::Uuid::new_v4()))
}

fn multipart_error(e: multer::Error) -> TubeError {
    match e {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            TubeError::payload_too_large(e.to_string())
        }
        other => TubeError::bad_request(format!("Failed to parse multipart data: {other}")),
    }
}

fn io_error(e: std::io::Error) -> TubeError {
    TubeError::general_error(format!("Failed to store upload: {e}"))
}
