//! Query cache keyed like the UI's queries.
//!
//! Entries expire per key kind; expired entries are treated as absent but
//! stay around so optimistic updates still have something to patch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::types::Video;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Videos { limit: Option<usize>, offset: Option<usize> },
    Video(String),
    VideosByOwner { address: String, limit: Option<usize> },
}

impl QueryKey {
    /// Keys that hold a list of videos. An upload invalidates all of them.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Videos { .. } | Self::VideosByOwner { .. })
    }
}

/// How long each kind of entry counts as fresh.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub videos: Duration,
    pub video: Duration,
    pub videos_by_owner: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            videos: Duration::ZERO,
            video: Duration::from_secs(60),
            videos_by_owner: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    fn ttl(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::Videos { .. } => self.videos,
            QueryKey::Video(_) => self.video,
            QueryKey::VideosByOwner { .. } => self.videos_by_owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    List(Vec<Video>),
    One(Video),
}

#[derive(Debug)]
struct Entry {
    value: Cached,
    stored_at: Instant,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    config: CacheConfig,
    entries: RwLock<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The cached value if it is still fresh.
    pub fn fresh(&self, key: &QueryKey) -> Option<Cached> {
        let ttl = self.config.ttl(key);
        self.entries
            .read()
            .get(key)
            .filter(|e| e.stored_at.elapsed() < ttl)
            .map(|e| e.value.clone())
    }

    /// The cached value regardless of age.
    pub fn peek(&self, key: &QueryKey) -> Option<Cached> {
        self.entries.read().get(key).map(|e| e.value.clone())
    }

    pub fn insert(&self, key: QueryKey, value: Cached) {
        self.entries.write().insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.entries.write().remove(key);
    }

    pub fn invalidate_lists(&self) {
        self.entries.write().retain(|k, _| !k.is_list());
    }

    /// Apply `f` to the cached single-video record, if any. Returns whether
    /// a record was found. Freshness is left untouched.
    pub fn update_video<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Video),
    {
        let key = QueryKey::Video(id.to_string());
        match self.entries.write().get_mut(&key) {
            Some(Entry {
                value: Cached::One(video),
                ..
            }) => {
                f(video);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
