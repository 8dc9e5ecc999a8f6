use crate::causality::VersionSnapshot;

use serde::{Deserialize, Serialize};

/// A single versioned value held by the store.
///
/// Entries are never mutated in place; a newer version replaces the whole
/// entry under the key's shard lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// `None` marks a tombstone: a delete that still carries a version.
    pub value: Option<String>,
    /// Milliseconds since the epoch, taken from the store's clock.
    pub inserted_at: u64,
    pub version: VersionSnapshot,
}

impl CacheEntry {
    pub fn new(value: Option<String>, inserted_at: u64, version: VersionSnapshot) -> Self {
        Self {
            value,
            inserted_at,
            version,
        }
    }

    /// An entry is expired once its age reaches the TTL.
    ///
    /// Reads, the apply path and the sweeper all go through this check.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.inserted_at) >= ttl_ms
    }
}
