//! Node Module
//!
//! Identity of a cache node and the assembly that turns a configuration
//! into a running HTTP service.

pub mod server;
pub mod types;

pub use server::{CacheNode, router};
pub use types::NodeId;
