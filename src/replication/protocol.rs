//! Replication Network Protocol
//!
//! Defines the HTTP endpoints and the Data Transfer Objects (DTOs) exchanged
//! between clients and nodes, and between peers.
//!
//! All bodies are JSON. The peer wire record is [`Update`].

use crate::causality::VersionSnapshot;
use crate::node::types::NodeId;
use crate::storage::CacheEntry;

use serde::{Deserialize, Deserializer, Serialize};

// --- API Endpoints ---

/// Public endpoint for client writes.
pub const ENDPOINT_PUT: &str = "/put";
/// Public endpoint for client deletes (tombstone writes).
pub const ENDPOINT_DELETE: &str = "/delete";
/// Public endpoint for client reads; the key follows as a path segment or
/// as the `key` query parameter.
pub const ENDPOINT_GET: &str = "/get";
/// Peer endpoint receiving fanned-out updates.
pub const ENDPOINT_UPDATE: &str = "/update";
/// Node status.
pub const ENDPOINT_STATS: &str = "/stats";

// --- Data Transfer Objects ---

/// A versioned write, as applied locally and as sent to peers.
///
/// `value: null` is a delete. A missing, null or empty `version` is the
/// bottom version: it only wins against a key with no live entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Update {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "version_or_empty")]
    pub version: VersionSnapshot,
}

fn version_or_empty<'de, D>(deserializer: D) -> Result<VersionSnapshot, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<VersionSnapshot>::deserialize(deserializer)?.unwrap_or_default())
}

impl Update {
    pub fn new(key: impl Into<String>, value: Option<String>, version: VersionSnapshot) -> Self {
        Self {
            key: key.into(),
            value,
            version,
        }
    }

    /// The entry this update would install, stamped at `now_ms`.
    pub fn to_entry(&self, now_ms: u64) -> CacheEntry {
        CacheEntry::new(self.value.clone(), now_ms, self.version.clone())
    }
}

/// Client write request.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
}

/// Client delete request.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// Query string of `GET /get?key=...`.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// Acknowledgment for client writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
}

/// Acknowledgment for peer updates.
///
/// `applied` is false when the update lost the dominance check; that is
/// still a successful delivery.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub applied: bool,
}

/// Result of a local read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetResponse {
    pub found: bool,
    pub value: Option<String>,
}

impl GetResponse {
    pub fn from_value(value: Option<String>) -> Self {
        Self {
            found: value.is_some(),
            value,
        }
    }
}

/// Node status snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub node_id: NodeId,
    pub is_leader: bool,
    pub peers: Vec<String>,
    pub entries: usize,
    pub ttl_ms: u64,
}
