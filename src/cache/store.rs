//! Response cache keyed by locator.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::observability::metrics;
use crate::resource::Locator;

/// A stored response body with its validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized locator key.
    pub key: String,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub etag: Option<String>,
    /// Seconds since epoch when the entry was written.
    pub date: u64,
}

/// Storage used by caching resources.
///
/// Implementations must be safe to share between concurrent loads; writes
/// overwrite, the last writer wins.
pub trait CacheStore: Send + Sync {
    fn lookup(&self, locator: &Locator) -> Option<CacheEntry>;
    fn store(&self, locator: &Locator, data: Vec<u8>, etag: Option<String>, date: u64);
    fn remove(&self, locator: &Locator) -> Option<CacheEntry>;
}

/// Thread-safe in-memory cache with optional JSON persistence.
#[derive(Clone, Default)]
pub struct ResponseCache {
    inner: Arc<DashMap<String, CacheEntry>>,
    persistence_path: Option<String>,
}

impl ResponseCache {
    /// Create a new empty cache.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let cache = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, CacheEntry> = serde_json::from_reader(reader)?;
            for (key, entry) in map {
                cache.inner.insert(key, entry);
            }
            metrics::record_cache_size(cache.inner.len());
            tracing::info!(path, entries = cache.inner.len(), "Loaded response cache");
        }
        Ok(cache)
    }

    /// Save to the persistence path, if one is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let map: HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            serde_json::to_writer(writer, &map)?;
            tracing::info!(path = %path, entries = map.len(), "Saved response cache");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of all entries, sorted by key.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.clear();
        metrics::record_cache_size(0);
    }
}

impl CacheStore for ResponseCache {
    fn lookup(&self, locator: &Locator) -> Option<CacheEntry> {
        self.inner.get(&locator.key()).map(|r| r.value().clone())
    }

    fn store(&self, locator: &Locator, data: Vec<u8>, etag: Option<String>, date: u64) {
        let key = locator.key();
        self.inner.insert(
            key.clone(),
            CacheEntry {
                key,
                data,
                etag,
                date,
            },
        );
        metrics::record_cache_size(self.inner.len());
    }

    fn remove(&self, locator: &Locator) -> Option<CacheEntry> {
        let removed = self.inner.remove(&locator.key()).map(|(_, entry)| entry);
        metrics::record_cache_size(self.inner.len());
        removed
    }
}

/// Current time in seconds since epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> Locator {
        Locator::get("https://example.com/v1/config", "api").unwrap()
    }

    #[test]
    fn test_cache_operations() {
        let cache = ResponseCache::new(None);
        assert!(cache.lookup(&locator()).is_none());

        cache.store(&locator(), b"one".to_vec(), Some("\"1\"".into()), 10);
        let entry = cache.lookup(&locator()).unwrap();
        assert_eq!(entry.data, b"one");
        assert_eq!(entry.etag.as_deref(), Some("\"1\""));
        assert_eq!(entry.key, "GET https://example.com/v1/config");

        // Overwrite, last writer wins
        cache.store(&locator(), b"two".to_vec(), None, 20);
        let entry = cache.lookup(&locator()).unwrap();
        assert_eq!(entry.data, b"two");
        assert!(entry.etag.is_none());
        assert_eq!(cache.len(), 1);

        let removed = cache.remove(&locator()).unwrap();
        assert_eq!(removed.date, 20);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fake_locator_shares_key() {
        let cache = ResponseCache::new(None);
        cache.store(&locator(), b"x".to_vec(), None, 1);
        assert!(cache.lookup(&locator().as_fake()).is_some());
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir()
            .join(format!("resource-cache-{}.json", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .to_string();

        let cache = ResponseCache::new(Some(path.clone()));
        cache.store(&locator(), vec![0, 159, 255], Some("\"etag\"".into()), now_secs());
        cache.save_to_file().unwrap();

        let loaded = ResponseCache::load_from_file(&path).unwrap();
        let entry = loaded.lookup(&locator()).unwrap();
        assert_eq!(entry.data, vec![0, 159, 255]);
        assert_eq!(entry.etag.as_deref(), Some("\"etag\""));
        assert_eq!(loaded.entries().len(), 1);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_gives_empty_cache() {
        let cache = ResponseCache::load_from_file("/nonexistent/cache.json").unwrap();
        assert!(cache.is_empty());
    }
}
