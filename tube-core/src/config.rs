//! # Configuration
//!
//! A flat string key/value store, set through `app.set()` and read through
//! `app.get()`. Keys are dotted (`walrus.publisherUrl`, `http.port`).
//!
//! ```rust
//! use tube_core::TubeApp;
//! let app = TubeApp::<(), ()>::new();
//!
//! app.set("paginate.default", "50");
//! app.set("paginate.max", "100");
//!
//! assert_eq!(app.get("paginate.default"), Some("50".to_string()));
//! assert_eq!(app.config_snapshot().get_usize("paginate.max"), Some(100));
//! ```
//!
//! Loading values (environment, `.env`, files) is left to the application;
//! hooks receive an immutable [`TubeConfigSnapshot`] taken at call time.

use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Default)]
pub struct TubeConfig {
    values: HashMap<String, String>,
}

impl TubeConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> TubeConfigSnapshot {
        TubeConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TubeConfigSnapshot {
    map: HashMap<String, String>,
}

impl TubeConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    /// Parse a value, treating unparsable values as missing.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse::<T>().ok())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get_parsed(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_parsed(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_parsed(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let mut cfg = TubeConfig::new();
        cfg.set("walrus.epochs", "1");
        let snap = cfg.snapshot();
        cfg.set("walrus.epochs", "5");

        assert_eq!(snap.get_u64("walrus.epochs"), Some(1));
        assert_eq!(cfg.get("walrus.epochs"), Some("5"));
    }

    #[test]
    fn unparsable_values_read_as_missing() {
        let mut cfg = TubeConfig::new();
        cfg.set("paginate.max", "lots");
        cfg.set("walrus.permanent", " true ");
        let snap = cfg.snapshot();

        assert_eq!(snap.get_usize("paginate.max"), None);
        assert_eq!(snap.get_bool("walrus.permanent"), Some(true));
        assert!(cfg.has("paginate.max"));
    }
}
