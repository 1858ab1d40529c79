use std::collections::HashMap;

use serde_json::Value;
use tube_axum::middlewares::UploadedFile;

use crate::models::{NewVideo, ZERO_ADDRESS};
use crate::services::TubeParams;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 100;

/// Paging for list calls. `ValidatePagination` has already rejected bad
/// values and capped `limit` by the time a service sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: usize,
    pub offset: usize,
    pub walrus_only: bool,
}

impl From<&TubeParams> for ListParams {
    fn from(params: &TubeParams) -> Self {
        let limit = params
            .query_str("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .map(|v| v.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);

        let offset = params
            .query_str("offset")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let walrus_only = params
            .query_str("walrusOnly")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            limit,
            offset,
            walrus_only,
        }
    }
}

/// Query string of `POST /videos/register`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterParams {
    pub blob_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub is_short: bool,
    pub thumbnail_blob_id: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl From<&TubeParams> for RegisterParams {
    fn from(params: &TubeParams) -> Self {
        let text = |key: &str| params.query_str(key).map(str::to_string);

        Self {
            blob_id: text("blobId").or_else(|| text("cid")),
            title: text("title"),
            description: text("description"),
            owner: text("owner"),
            is_short: params.query_str("isShort") == Some("true"),
            thumbnail_blob_id: text("thumbnailBlobId").or_else(|| text("thumbnailCid")),
            thumbnail_url: text("thumbnailUrl"),
        }
    }
}

impl RegisterParams {
    /// `None` when `blobId` or `title` is missing.
    pub fn into_new_video(self) -> Option<NewVideo> {
        Some(NewVideo {
            blob_id: self.blob_id?,
            title: self.title?,
            description: self.description.unwrap_or_default(),
            owner: self.owner.unwrap_or_else(|| ZERO_ADDRESS.to_string()),
            is_short: self.is_short,
            thumbnail_blob_id: self.thumbnail_blob_id,
            thumbnail_url: self.thumbnail_url,
        })
    }
}

/// Body of `POST /videos/upload` once the multipart middleware has written
/// the file parts to disk.
#[derive(Debug, Default)]
pub struct UploadParts {
    pub video: Option<UploadedFile>,
    pub thumbnail: Option<UploadedFile>,
    pub text: HashMap<String, String>,
    /// File parts under any other field name. Only kept so they get removed.
    pub extra: Vec<UploadedFile>,
}

impl UploadParts {
    pub fn from_data(data: Option<Value>) -> Self {
        let mut parts = Self::default();
        let Some(Value::Object(fields)) = data else {
            return parts;
        };

        for (name, value) in fields {
            match value {
                Value::String(text) => {
                    parts.text.insert(name, text);
                }
                other => {
                    let Ok(file) = serde_json::from_value::<UploadedFile>(other) else {
                        continue;
                    };
                    match name.as_str() {
                        "video" => parts.video = Some(file),
                        "thumbnail" => parts.thumbnail = Some(file),
                        _ => parts.extra.push(file),
                    }
                }
            }
        }
        parts
    }

    /// Query value first, then the form field of the same name.
    pub fn field<'a>(&'a self, params: &'a TubeParams, key: &str) -> Option<&'a str> {
        params.query_str(key).or_else(|| {
            self.text
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
    }

    pub async fn discard(&self) {
        for file in self.video.iter().chain(self.thumbnail.iter()).chain(self.extra.iter()) {
            file.discard().await;
        }
    }
}
