//! File-backed index of uploaded videos that are not on chain yet.
//!
//! The whole list lives in memory, most recent first, and is written back
//! to a single JSON array file after every mutation. Mutations are
//! serialized; each write goes to a sibling temp file that is then renamed
//! over the target so readers never see a half-written file. The in-memory
//! list only changes once that write has succeeded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::models::Video;

pub struct VideoRegistry {
    path: PathBuf,
    videos: RwLock<Vec<Video>>,
    write_lock: Mutex<()>,
}

impl VideoRegistry {
    /// Load the registry. A missing file starts empty; an unreadable or
    /// corrupt one is logged and also starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let videos = match tokio::fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice::<Vec<Video>>(&raw) {
                Ok(videos) => {
                    tracing::info!(path = %path.display(), count = videos.len(), "loaded video registry");
                    videos
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt video registry, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable video registry, starting empty");
                Vec::new()
            }
        };

        Self {
            path,
            videos: RwLock::new(videos),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent first.
    pub fn list(&self) -> Vec<Video> {
        self.videos.read().clone()
    }

    pub fn len(&self) -> usize {
        self.videos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Match on record id or blob id.
    pub fn get(&self, id: &str) -> Option<Video> {
        self.videos.read().iter().find(|v| v.matches(id)).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.videos.read().iter().any(|v| v.matches(id))
    }

    pub fn by_owner(&self, owner: &str) -> Vec<Video> {
        self.videos
            .read()
            .iter()
            .filter(|v| v.owner == owner)
            .cloned()
            .collect()
    }

    /// Insert at the front. An existing record with the same id is replaced.
    pub async fn register(&self, video: Video) -> Result<Video> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.list();
        next.retain(|v| v.id != video.id);
        next.insert(0, video.clone());

        self.commit(next).await?;
        tracing::info!(id = %video.id, total = self.len(), "video registered");
        Ok(video)
    }

    /// Bump `views` and `updatedAt`. `None` when the id is unknown.
    pub async fn track_view(&self, id: &str, now: i64) -> Result<Option<Video>> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.list();
        let Some(video) = next.iter_mut().find(|v| v.matches(id)) else {
            return Ok(None);
        };
        video.views += 1;
        video.updated_at = now;
        let updated = video.clone();

        self.commit(next).await?;
        Ok(Some(updated))
    }

    /// `None` when the id is unknown.
    pub async fn remove(&self, id: &str) -> Result<Option<Video>> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.list();
        let Some(pos) = next.iter().position(|v| v.matches(id)) else {
            return Ok(None);
        };
        let removed = next.remove(pos);

        self.commit(next).await?;
        tracing::info!(id = %removed.id, "video removed from registry");
        Ok(Some(removed))
    }

    /// Write `next` to disk, then make it the served list. Callers hold
    /// `write_lock`. On a failed write the served list is left as it was.
    async fn commit(&self, next: Vec<Video>) -> Result<()> {
        self.persist(&next).await?;
        *self.videos.write() = next;
        Ok(())
    }

    async fn persist(&self, videos: &[Video]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let json = serde_json::to_vec_pretty(videos)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
