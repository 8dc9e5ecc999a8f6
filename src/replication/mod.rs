//! Replication Module
//!
//! The consistency engine of a cache node: local writes, peer updates and
//! leader-gated fan-out.
//!
//! ## Core Concepts
//! - **Leader Gating**: Only the leader fans writes out, so a full mesh never loops.
//! - **No Re-propagation**: Updates received from peers are applied, never forwarded.
//! - **Fire-and-forget**: Each peer delivery is its own bounded task; failures are logged.
//!
//! ## Submodules
//! - **`engine`**: `ReplicationEngine`, the write/apply/fan-out logic.
//! - **`transport`**: `PeerTransport` seam and its HTTP implementation.
//! - **`protocol`**: Endpoints and wire records.
//! - **`handlers`**: Axum handlers over the engine.

pub mod engine;
pub mod handlers;
pub mod protocol;
pub mod transport;

pub use engine::{EngineConfig, ReplicationEngine};
pub use protocol::Update;
pub use transport::{DeliveryFuture, HttpPeerTransport, PeerTransport};
