//! Error types for node configuration and peer delivery.

/// Errors surfaced by the glue around the replication core.
///
/// The core operations themselves never fail: stale updates and misses are
/// ordinary outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An environment setting could not be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// A peer answered the delivery with a non-success status.
    #[error("peer {peer} rejected update with status {status}")]
    PeerRejected { peer: String, status: u16 },

    /// A delivery did not finish within its time budget.
    #[error("delivery to {peer} timed out after {timeout_ms} ms")]
    DeliveryTimeout { peer: String, timeout_ms: u64 },

    /// Transport-level failure talking to a peer.
    #[error("delivery to {peer} failed: {source}")]
    Transport {
        peer: String,
        #[source]
        source: reqwest::Error,
    },
}
