//! Cached response state.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::Serialize;

use super::key::CacheKey;

/// The last 200 response accepted for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Status line, headers and body exactly as the origin sent them.
    pub raw_response: Bytes,
    /// `Last-Modified` validator, if the origin supplied one.
    pub last_modified: Option<String>,
    /// Time of the write. Diagnostic only; nothing expires.
    pub stored_at: SystemTime,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(raw_response: impl Into<Bytes>, last_modified: Option<String>) -> Self {
        Self {
            raw_response: raw_response.into(),
            last_modified,
            stored_at: SystemTime::now(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.raw_response.len()
    }
}

/// Metadata view of an entry, as exposed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub key: CacheKey,
    pub last_modified: Option<String>,
    /// Seconds since the Unix epoch.
    pub stored_at: u64,
    pub size_bytes: usize,
}

impl EntrySummary {
    pub fn from_entry(key: &CacheKey, entry: &CacheEntry) -> Self {
        Self {
            key: key.clone(),
            last_modified: entry.last_modified.clone(),
            stored_at: entry
                .stored_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            size_bytes: entry.size_bytes(),
        }
    }
}
