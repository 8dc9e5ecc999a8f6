use super::clock::{Clock, SystemClock};
use super::types::CacheEntry;
use crate::causality::VersionSnapshot;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// The node's versioned key-value map.
///
/// Backed by a sharded `DashMap`: readers and writers on different keys
/// proceed in parallel, and all writes to one key serialize on its shard
/// lock, which is what makes [`apply_if_newer`] atomic per key.
///
/// [`apply_if_newer`]: VersionedStore::apply_if_newer
pub struct VersionedStore {
    entries: DashMap<String, CacheEntry>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl VersionedStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms: ttl.as_millis() as u64,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Returns the live value for `key`.
    ///
    /// Expired entries and tombstones read as misses whether or not the
    /// sweeper has removed them yet.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, self.now_ms())
    }

    pub fn get_at(&self, key: &str, now_ms: u64) -> Option<String> {
        let guard = self.entries.get(key)?;
        let entry = guard.value();
        if entry.is_expired(now_ms, self.ttl_ms) {
            return None;
        }
        entry.value.clone()
    }

    /// Version of the live entry for `key`, tombstones included.
    pub fn version_of(&self, key: &str) -> Option<VersionSnapshot> {
        let now = self.now_ms();
        self.entries
            .get(key)
            .filter(|guard| !guard.value().is_expired(now, self.ttl_ms))
            .map(|guard| guard.value().version.clone())
    }

    /// Replaces the entry for `key` unless the stored version already covers
    /// `candidate`.
    ///
    /// A missing or expired entry loses to anything. A stored version that
    /// dominates or equals the candidate's keeps its place. Concurrent
    /// versions resolve in arrival order: the candidate replaces the
    /// incumbent, so a key never freezes on a version the writer cannot
    /// observe. Returns whether the candidate was stored.
    pub fn apply_if_newer(&self, key: &str, candidate: CacheEntry) -> bool {
        let now = self.now_ms();

        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                true
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.is_expired(now, self.ttl_ms) {
                    slot.insert(candidate);
                    return true;
                }

                match current.version.partial_cmp(&candidate.version) {
                    Some(Ordering::Greater) | Some(Ordering::Equal) => {
                        tracing::debug!(
                            "Kept stored version of '{}': incoming {:?} is stale against {:?}",
                            key,
                            candidate.version,
                            current.version
                        );
                        false
                    }
                    Some(Ordering::Less) => {
                        slot.insert(candidate);
                        true
                    }
                    None => {
                        tracing::debug!(
                            "Concurrent versions for '{}': {:?} replaces {:?}",
                            key,
                            candidate.version,
                            current.version
                        );
                        slot.insert(candidate);
                        true
                    }
                }
            }
        }
    }

    /// Installs a write originated on this node.
    ///
    /// The stamped version is `snapshot` joined with the live stored version,
    /// computed under the key's shard lock, so the write always lands and
    /// covers everything this node held for the key. Returns the version
    /// that was stored.
    pub fn apply_local(
        &self,
        key: &str,
        value: Option<String>,
        snapshot: VersionSnapshot,
    ) -> VersionSnapshot {
        let now = self.now_ms();

        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(value, now, snapshot.clone()));
                snapshot
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                let version = if current.is_expired(now, self.ttl_ms) {
                    snapshot
                } else {
                    snapshot.joined(&current.version)
                };
                slot.insert(CacheEntry::new(value, now, version.clone()));
                version
            }
        }
    }

    /// Removes every entry whose age reached the TTL at `now_ms`.
    ///
    /// Runs shard by shard, so it never blocks the whole map. Returns the
    /// number of entries removed.
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let ttl_ms = self.ttl_ms;
        let mut removed = 0usize;

        self.entries.retain(|_, entry| {
            if entry.is_expired(now_ms, ttl_ms) {
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    /// Number of physically present entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
