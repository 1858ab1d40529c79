use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tube_blob::{BlobStore, StoreOptions};
use tube_core::{bail_tube, CallContext, ServiceCapabilities, TubeError, TubeService};

use crate::models::{NewVideo, Video, ZERO_ADDRESS};
use crate::services::adapters::VideoRegistry;
use crate::services::TubeParams;
use crate::sui::{ChainQuery, ChainResult};

use super::videos_params::{ListParams, RegisterParams, UploadParts};
use super::videos_shared::{self, blob_failure, now_millis};

/// Videos from two sources: the local registry of uploads that are not on
/// chain yet, and `VideoPlatform::Video` objects read from Sui. Registry
/// records win when both know the same id.
pub struct VideosService {
    registry: Arc<VideoRegistry>,
    chain: Arc<dyn ChainQuery>,
    blobs: Arc<dyn BlobStore>,
}

impl VideosService {
    pub fn new(registry: Arc<VideoRegistry>, chain: Arc<dyn ChainQuery>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            registry,
            chain,
            blobs,
        }
    }

    /// Registry records first, then chain videos. The chain is paged from
    /// where the registry ends, with some slack for records both hold.
    async fn list(&self, page: ListParams) -> Vec<Video> {
        let registry = self.registry.list();
        let mut videos: Vec<Video> = registry.iter().skip(page.offset).take(page.limit).cloned().collect();

        let wanted = page.limit - videos.len();
        if page.walrus_only || wanted == 0 {
            return videos;
        }

        let chain_offset = page.offset.saturating_sub(registry.len());
        let slack = registry.len().min(page.limit);
        let chain = degrade(
            self.chain.list_videos(wanted + slack, chain_offset).await,
            "list videos",
        );
        merge_chain(&registry, &mut videos, chain);
        videos.truncate(page.limit);
        videos
    }

    async fn by_owner(&self, owner: &str, page: ListParams) -> Vec<Video> {
        let mut videos = self.registry.by_owner(owner);
        let chain = degrade(
            self.chain.list_videos_by_owner(owner, page.limit).await,
            "list videos by owner",
        );
        let known = videos.clone();
        merge_chain(&known, &mut videos, chain);
        videos.truncate(page.limit);
        videos
    }

    /// Registry first, then chain. Chain failures read as "not there".
    async fn lookup(&self, id: &str) -> Option<Video> {
        if let Some(video) = self.registry.get(id) {
            return Some(video);
        }

        match self.chain.get_video(id).await {
            Ok(video) => video,
            Err(e) => {
                tracing::warn!(id, error = %e, "chain lookup failed");
                None
            }
        }
    }

    async fn upload(&self, data: Option<Value>, params: &TubeParams) -> Result<Value> {
        let parts = UploadParts::from_data(data);
        let result = self.store_upload(&parts, params).await;
        parts.discard().await;
        result
    }

    async fn store_upload(&self, parts: &UploadParts, params: &TubeParams) -> Result<Value> {
        let Some(file) = parts.video.as_ref() else {
            bail_tube!(bad_request, "No video file uploaded");
        };

        let options = StoreOptions::default();

        let stored = self
            .blobs
            .upload(&file.temp_path, file.content_type.as_deref(), &options)
            .await
            .map_err(|e| blob_failure(e, "video upload"))?;

        let thumbnail = match parts.thumbnail.as_ref() {
            Some(thumb) => Some(
                self.blobs
                    .upload(&thumb.temp_path, thumb.content_type.as_deref(), &options)
                    .await
                    .map_err(|e| blob_failure(e, "thumbnail upload"))?,
            ),
            None => None,
        };

        let blob_id = stored.blob_id.to_string();
        let filename = file.filename.clone().unwrap_or_else(|| blob_id.clone());

        let new = NewVideo {
            blob_id: blob_id.clone(),
            title: parts
                .field(params, "title")
                .map_or_else(|| filename.clone(), str::to_string),
            description: parts.field(params, "description").unwrap_or_default().to_string(),
            owner: parts.field(params, "owner").unwrap_or(ZERO_ADDRESS).to_string(),
            is_short: parts.field(params, "isShort") == Some("true"),
            thumbnail_blob_id: thumbnail.as_ref().map(|t| t.blob_id.to_string()),
            thumbnail_url: thumbnail.as_ref().map(|t| t.url.clone()),
        };
        let video = self.registry.register(Video::registered(new, now_millis())).await?;

        tracing::info!(blob_id = %blob_id, size = file.size, owner = %video.owner, "video uploaded");

        Ok(json!({
            "success": true,
            "blobId": blob_id,
            "url": stored.url,
            "filename": filename,
            "size": file.size,
            "thumbnailBlobId": video.thumbnail_blob_id,
            "thumbnailUrl": video.thumbnail_url,
            "message": "Video uploaded successfully to Walrus",
            "note": "Video is registered off-chain. Call add_video on the VideoPlatform contract to publish it on Sui.",
        }))
    }

    async fn register(&self, params: &TubeParams) -> Result<Value> {
        let Some(new) = RegisterParams::from(params).into_new_video() else {
            bail_tube!(bad_request, "blobId and title are required");
        };

        let video = self.registry.register(Video::registered(new, now_millis())).await?;

        Ok(json!({
            "success": true,
            "video": serde_json::to_value(&video)?,
            "message": "Video registered successfully",
        }))
    }

    /// `viewer` is whoever the view is credited to: the `viewer` query
    /// parameter, else the caller's wallet.
    async fn track_view(&self, id: &str, viewer: Option<&str>) -> Result<Value> {
        tracing::debug!(id, viewer = viewer.unwrap_or(""), "view");

        let views = match self.registry.track_view(id, now_millis()).await? {
            Some(video) => video.views,
            None => match self.lookup(id).await {
                Some(video) => video.views,
                None => bail_tube!(not_found, "Video not found: {}", id),
            },
        };

        Ok(json!({ "videoId": id, "views": views, "viewer": viewer }))
    }
}

/// Append chain videos that `registry` does not already hold.
fn merge_chain(registry: &[Video], videos: &mut Vec<Video>, chain: Vec<Video>) {
    let known: HashSet<String> = registry
        .iter()
        .flat_map(|v| [v.id.clone(), v.blob_id.clone()])
        .collect();

    videos.extend(
        chain
            .into_iter()
            .filter(|v| !known.contains(&v.id) && !known.contains(&v.blob_id)),
    );
}

fn degrade<T: Default>(result: ChainResult<T>, action: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "{action} on chain failed, continuing without chain data");
        T::default()
    })
}

fn to_values(videos: Vec<Video>) -> Result<Vec<Value>> {
    videos
        .into_iter()
        .map(|v| serde_json::to_value(v).map_err(Into::into))
        .collect()
}

#[async_trait]
impl TubeService<Value, TubeParams> for VideosService {
    fn capabilities(&self) -> ServiceCapabilities {
        videos_shared::capabilities()
    }

    async fn find(&self, _ctx: &CallContext, params: TubeParams) -> Result<Vec<Value>> {
        let page = ListParams::from(&params);
        to_values(self.list(page).await)
    }

    async fn get(&self, _ctx: &CallContext, id: &str, _params: TubeParams) -> Result<Value> {
        match self.lookup(id).await {
            Some(video) => Ok(serde_json::to_value(video)?),
            None => bail_tube!(not_found, "Video not found: {}", id),
        }
    }

    async fn remove(&self, _ctx: &CallContext, id: &str, _params: TubeParams) -> Result<Value> {
        match self.registry.remove(id).await? {
            Some(_) => Ok(json!({
                "success": true,
                "removed": true,
                "message": "Video removed from registry",
            })),
            None => bail_tube!(not_found, "Video not found: {}", id),
        }
    }

    async fn custom(
        &self,
        ctx: &CallContext,
        method: &str,
        id: Option<&str>,
        data: Option<Value>,
        params: TubeParams,
    ) -> Result<Value> {
        if let (videos_shared::UPLOAD, None) = (method, id) {
            return self.upload(data, &params).await;
        }

        // Only uploads consume files.
        UploadParts::from_data(data).discard().await;

        match (method, id) {
            (videos_shared::OWNER, Some(owner)) => {
                let page = ListParams::from(&params);
                Ok(Value::Array(to_values(self.by_owner(owner, page).await)?))
            }
            (videos_shared::REGISTER, None) => self.register(&params).await,
            (videos_shared::VIEW, Some(id)) => {
                let viewer = params.query_str("viewer").or(ctx.wallet.as_deref());
                self.track_view(id, viewer).await
            }
            _ => Err(TubeError::method_not_allowed(format!(
                "Method '{method}' cannot be called {}",
                if id.is_some() { "on a record" } else { "without a record id" }
            ))
            .into_anyhow()),
        }
    }
}
