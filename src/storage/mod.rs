//! Versioned Storage Module
//!
//! Implements the node-local, in-memory key-value store.
//!
//! ## Core Concepts
//! - **Versioned Entries**: Every value carries the vector clock it was written with.
//! - **Causal Replacement**: An entry is never replaced by a version it dominates or equals;
//!   concurrent versions replace in arrival order.
//! - **Expiry**: Entries older than the TTL read as misses and are purged by the sweeper.
//! - **Clock**: One injectable time source shared by reads and sweeps.

pub mod clock;
pub mod memory;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::VersionedStore;
pub use types::CacheEntry;
