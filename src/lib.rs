//! Peer-Replicated Cache Node Library
//!
//! This library crate defines the modules of a single in-memory cache node
//! that replicates writes to a static peer set and resolves conflicting
//! versions with vector clocks. The binary (`main.rs`) only reads the
//! configuration and drives the node lifecycle.
//!
//! ## Architecture Modules
//!
//! - **`causality`**: Vector clocks. The per-node tracker and the immutable
//!   snapshots compared by strict causal dominance.
//! - **`storage`**: The versioned key-value store. Per-key atomic
//!   replace-unless-covered, TTL expiry on read, and the shared clock.
//! - **`replication`**: The engine that stamps local writes, applies remote
//!   updates and, on the leader only, fans writes out to peers.
//! - **`eviction`**: The background sweeper purging expired entries.
//! - **`node`**: Node identity and the HTTP service assembly.
//! - **`config`**: Environment-driven startup configuration.

pub mod causality;
pub mod config;
pub mod error;
pub mod eviction;
pub mod node;
pub mod replication;
pub mod storage;

pub use error::CacheError;
