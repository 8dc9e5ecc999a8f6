//! Eviction Module
//!
//! Background removal of expired cache entries, independent of request traffic.

pub mod sweeper;

pub use sweeper::{EvictionSweeper, SweeperHandle};
