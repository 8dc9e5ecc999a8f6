//! Causality Tracking Module
//!
//! Vector clocks used to decide whether an incoming version of a key should
//! replace the stored one.
//!
//! ## Core Concepts
//! - **Tracker**: The live clock of this node, bumped only by local writes.
//! - **Snapshot**: An immutable copy stamped onto every update at write time.
//! - **Dominance**: Strict partial order; concurrent versions dominate neither way.

pub mod vector_clock;

pub use vector_clock::{CausalityTracker, VersionSnapshot};

#[cfg(test)]
mod tests;
