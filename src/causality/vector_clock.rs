//! Vector Clock Implementation
//!
//! `CausalityTracker` is the live, mutable clock owned by one node.
//! `VersionSnapshot` is the frozen copy stamped onto every outgoing update.

use crate::node::types::NodeId;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Per-node logical clock.
///
/// Only the owning node's local-write path mutates it, through [`increment`].
///
/// [`increment`]: CausalityTracker::increment
#[derive(Debug, Clone, Default)]
pub struct CausalityTracker {
    counters: BTreeMap<NodeId, u64>,
}

impl CausalityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the counter for `node_id`, starting from an implicit zero.
    pub fn increment(&mut self, node_id: &NodeId) -> u64 {
        let counter = self.counters.entry(node_id.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Immutable copy of the current counters.
    ///
    /// Later increments on the tracker never alter a snapshot already issued.
    pub fn snapshot(&self) -> VersionSnapshot {
        VersionSnapshot {
            counters: self.counters.clone(),
        }
    }

    pub fn get(&self, node_id: &NodeId) -> u64 {
        self.counters.get(node_id).copied().unwrap_or(0)
    }
}

/// Frozen vector clock attached to a cache entry or an update.
///
/// On the wire this is a plain `{ "<node-id>": <counter> }` object; an
/// omitted or empty map is the bottom version, dominated by any other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSnapshot {
    counters: BTreeMap<NodeId, u64>,
}

impl VersionSnapshot {
    /// The bottom version.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: &NodeId) -> u64 {
        self.counters.get(node_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counters.values().all(|&c| c == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, u64)> {
        self.counters.iter().map(|(id, c)| (id, *c))
    }

    /// Strict causal dominance.
    ///
    /// `self` dominates `other` when no counter of `self` is behind the
    /// matching counter of `other` and at least one is ahead. Counters are
    /// compared over the union of node ids, missing ones reading as zero,
    /// which keeps the relation irreflexive and transitive.
    pub fn dominates(&self, other: &VersionSnapshot) -> bool {
        self.partial_cmp(other) == Some(Ordering::Greater)
    }

    /// Neither version dominates the other and they are not equal.
    pub fn is_concurrent_with(&self, other: &VersionSnapshot) -> bool {
        self.partial_cmp(other).is_none()
    }

    /// Per-node maximum of both versions.
    pub fn joined(&self, other: &VersionSnapshot) -> VersionSnapshot {
        let mut counters = self.counters.clone();
        for (id, counter) in other.iter() {
            let slot = counters.entry(id.clone()).or_insert(0);
            *slot = (*slot).max(counter);
        }
        VersionSnapshot { counters }
    }
}

impl PartialOrd for VersionSnapshot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let mut ahead = false;
        let mut behind = false;

        for id in self.counters.keys().chain(other.counters.keys()) {
            match self.get(id).cmp(&other.get(id)) {
                Ordering::Greater => ahead = true,
                Ordering::Less => behind = true,
                Ordering::Equal => {}
            }
            if ahead && behind {
                return None;
            }
        }

        match (ahead, behind) {
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            (false, false) => Some(Ordering::Equal),
            (true, true) => None,
        }
    }
}

impl PartialEq for VersionSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl Eq for VersionSnapshot {}

impl FromIterator<(NodeId, u64)> for VersionSnapshot {
    fn from_iter<I: IntoIterator<Item = (NodeId, u64)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().collect(),
        }
    }
}
