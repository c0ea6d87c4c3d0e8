//! Shared, lock-guarded response cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;

use super::entry::{CacheEntry, EntrySummary};
use super::key::CacheKey;

/// Concurrency-safe map from cache key to the last accepted response.
///
/// Clones share the same map. Every access goes through a single mutex, so
/// a reader sees either the old or the new entry for a key, never a mix.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl CacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a copy of the entry for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Install `entry` for `key`, replacing any previous entry.
    pub fn put(&self, key: CacheKey, entry: CacheEntry) {
        let mut map = self.lock();
        map.insert(key, entry);
        metrics::record_cache_size(map.len());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Metadata for every entry, sorted by key.
    pub fn snapshot(&self) -> Vec<EntrySummary> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(key, entry)| EntrySummary::from_entry(key, entry))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    // Writers only ever insert whole entries, so a poisoned map is still
    // consistent and safe to keep using.
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
