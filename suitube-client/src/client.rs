use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;

use crate::cache::{CacheConfig, Cached, QueryCache, QueryKey};
use crate::error::{ClientError, ClientResult, ServerError};
use crate::form::UploadForm;
use crate::types::{UploadMetadata, UploadResponse, Video, ViewCount};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:3001`.
    pub base_url: String,
    pub timeout: Duration,
    pub cache: CacheConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(300),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

#[derive(Clone)]
pub struct SuiTubeClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    cache: Arc<QueryCache>,
}

impl SuiTubeClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            cache: Arc::new(QueryCache::new(config.cache)),
            config: Arc::new(config),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Direct URL for a player; the backend serves byte ranges from it.
    pub fn stream_url(&self, id: &str) -> String {
        self.url(&format!("/videos/{id}/stream"))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            let err = ServerError::from_response(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), message = %err.message, "request failed");
            return Err(ClientError::Api(err));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn list_videos(&self, limit: Option<usize>, offset: Option<usize>) -> ClientResult<Vec<Video>> {
        let key = QueryKey::Videos { limit, offset };
        if let Some(Cached::List(videos)) = self.cache.fresh(&key) {
            return Ok(videos);
        }

        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let videos: Vec<Video> = self.send(self.request(Method::GET, "/videos").query(&query)).await?;
        self.cache.insert(key, Cached::List(videos.clone()));
        Ok(videos)
    }

    pub async fn video(&self, id: &str) -> ClientResult<Video> {
        let key = QueryKey::Video(id.to_string());
        if let Some(Cached::One(video)) = self.cache.fresh(&key) {
            return Ok(video);
        }

        let video: Video = self.send(self.request(Method::GET, &format!("/videos/{id}"))).await?;
        self.cache.insert(key, Cached::One(video.clone()));
        Ok(video)
    }

    pub async fn videos_by_owner(&self, address: &str, limit: Option<usize>) -> ClientResult<Vec<Video>> {
        let key = QueryKey::VideosByOwner {
            address: address.to_string(),
            limit,
        };
        if let Some(Cached::List(videos)) = self.cache.fresh(&key) {
            return Ok(videos);
        }

        let mut req = self.request(Method::GET, &format!("/videos/owner/{address}"));
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }

        let videos: Vec<Video> = self.send(req).await?;
        self.cache.insert(key, Cached::List(videos.clone()));
        Ok(videos)
    }

    /// Stream `path` to the backend as multipart.
    ///
    /// `progress` receives the share of the file handed to the transport,
    /// 0 to 99 while sending and 100 once the server has answered.
    pub async fn upload_video(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        progress: watch::Sender<u8>,
    ) -> ClientResult<UploadResponse> {
        if metadata.title.trim().is_empty() {
            return Err(ClientError::Invalid("title is required".to_string()));
        }

        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let progress = Arc::new(progress);
        progress.send_replace(0);

        let sent_progress = Arc::clone(&progress);
        let mut sent = 0u64;
        let body = ReaderStream::new(file).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            sent_progress.send_replace(percent(sent, total));
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(filename.clone())
            .mime_str(mime_for(path))?;

        let mut form = Form::new().part("video", part).text("title", metadata.title.clone());
        if let Some(description) = &metadata.description {
            form = form.text("description", description.clone());
        }
        if let Some(owner) = &metadata.owner {
            form = form.text("owner", owner.clone());
        }

        tracing::debug!(file = %filename, size = total, "uploading video");
        let response: UploadResponse = self
            .send(self.request(Method::POST, "/videos/upload").multipart(form))
            .await?;

        progress.send_replace(100);
        self.cache.invalidate_lists();
        Ok(response)
    }

    /// Count a view. The cached record is bumped before the request and
    /// set to the server's count after it; a failed request rolls it back.
    pub async fn track_view(&self, id: &str, viewer: Option<&str>) -> ClientResult<ViewCount> {
        let bumped = self.cache.update_video(id, |v| v.views += 1);

        let mut req = self.request(Method::POST, &format!("/videos/{id}/view"));
        if let Some(viewer) = viewer {
            req = req.query(&[("viewer", viewer)]);
        }

        let result: ClientResult<ViewCount> = self.send(req).await;
        match &result {
            Ok(count) => {
                self.cache.update_video(id, |v| v.views = count.views);
            }
            Err(_) if bumped => {
                self.cache.update_video(id, |v| v.views = v.views.saturating_sub(1));
            }
            Err(_) => {}
        }

        self.cache.invalidate_lists();
        result
    }

    /// Drive `form` through an upload: Submitting with live progress, then
    /// Success or Error. The outcome is also returned.
    pub async fn submit_form(&self, form: &mut UploadForm) -> ClientResult<UploadResponse> {
        let path = form.submit()?;
        let metadata = form.metadata.clone();

        let (tx, mut rx) = watch::channel(0u8);
        let upload = self.upload_video(&path, &metadata, tx);
        tokio::pin!(upload);

        let result = loop {
            tokio::select! {
                res = &mut upload => break res,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break (&mut upload).await;
                    }
                    let p = *rx.borrow_and_update();
                    form.progress(p)?;
                }
            }
        };

        match result {
            Ok(response) => {
                form.progress(100)?;
                form.succeed(response.clone())?;
                Ok(response)
            }
            Err(e) => {
                form.fail(e.to_string())?;
                Err(e)
            }
        }
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (sent.saturating_mul(100) / total).min(99) as u8
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("ogv") => "video/ogg",
        _ => "application/octet-stream",
    }
}
