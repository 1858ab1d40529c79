use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tube_blob::{BlobId, BlobStore};
use tube_core::bail_tube;
use tube_core::hooks::{HookContext, TubeAfterHook, TubeBeforeHook};

use crate::services::TubeParams;

use super::videos_params::{DEFAULT_LIMIT, MAX_LIMIT};

/// Rejects non-positive or non-numeric `limit` and negative or non-numeric
/// `offset`, caps `limit` at `paginate.max`, and writes the normalized
/// values back into the query so the service reads plain numbers.
pub struct ValidatePagination;

#[async_trait]
impl TubeBeforeHook<Value, TubeParams> for ValidatePagination {
    async fn run(&self, ctx: &mut HookContext<Value, TubeParams>) -> Result<()> {
        let default = ctx.config.get_usize("paginate.default").unwrap_or(DEFAULT_LIMIT);
        let max = ctx.config.get_usize("paginate.max").unwrap_or(MAX_LIMIT);

        let limit = match ctx.params.query_str("limit") {
            None => default.min(max),
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(max),
                _ => bail_tube!(bad_request, "Limit must be a positive number"),
            },
        };

        let offset = match ctx.params.query_str("offset") {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => usize::try_from(n).unwrap_or(usize::MAX),
                _ => bail_tube!(bad_request, "Offset must be a non-negative number"),
            },
        };

        ctx.params.query.insert("limit".to_string(), limit.to_string());
        ctx.params.query.insert("offset".to_string(), offset.to_string());
        Ok(())
    }
}

/// Adds `videoUrl` (aggregator read URL) next to every `blobId`.
pub struct AttachVideoUrl {
    blobs: Arc<dyn BlobStore>,
}

impl AttachVideoUrl {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    fn attach(&self, value: &mut Value) {
        match value {
            Value::Array(items) => items.iter_mut().for_each(|item| self.attach(item)),
            Value::Object(map) => {
                if let Some(video) = map.get_mut("video") {
                    self.attach(video);
                    return;
                }

                let url = map
                    .get("blobId")
                    .and_then(Value::as_str)
                    .map(|id| self.blobs.url(&BlobId::new(id)));
                if let Some(url) = url {
                    map.insert("videoUrl".to_string(), Value::String(url));
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl TubeAfterHook<Value, TubeParams> for AttachVideoUrl {
    async fn run(&self, ctx: &mut HookContext<Value, TubeParams>) -> Result<()> {
        ctx.map_result(|mut value| {
            self.attach(&mut value);
            value
        });
        Ok(())
    }
}
