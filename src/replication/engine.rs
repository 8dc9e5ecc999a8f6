//! Replication Engine
//!
//! Decides, for every write, whether it lands in the local store and whether
//! it is fanned out to peers.
//!
//! ## Responsibilities
//! - **Local writes**: Bump this node's clock, stamp an [`Update`], apply it,
//!   and fan it out when this node is the leader.
//! - **Remote updates**: Apply as-is. Never re-stamped, never re-propagated.
//! - **Delivery**: One independent, timeout-bounded task per peer. Failures
//!   are logged and dropped.

use super::protocol::{GetResponse, Update};
use super::transport::PeerTransport;
use crate::causality::CausalityTracker;
use crate::node::types::NodeId;
use crate::storage::VersionedStore;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

/// Construction parameters for [`ReplicationEngine`].
pub struct EngineConfig {
    pub node_id: NodeId,
    /// Effective leadership, already resolved from the configuration.
    pub is_leader: bool,
    pub peers: Vec<String>,
    /// Upper bound on one delivery, retries included.
    pub delivery_timeout: Duration,
}

pub struct ReplicationEngine {
    node_id: NodeId,
    is_leader: bool,
    peers: Vec<String>,
    delivery_timeout: Duration,
    tracker: Mutex<CausalityTracker>,
    store: Arc<VersionedStore>,
    transport: Arc<dyn PeerTransport>,
    deliveries: Mutex<JoinSet<()>>,
}

impl ReplicationEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<VersionedStore>,
        transport: Arc<dyn PeerTransport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id: config.node_id,
            is_leader: config.is_leader,
            peers: config.peers,
            delivery_timeout: config.delivery_timeout,
            tracker: Mutex::new(CausalityTracker::new()),
            store,
            transport,
            deliveries: Mutex::new(JoinSet::new()),
        })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    /// Originates a write on this node.
    ///
    /// `value: None` writes a tombstone. The stamped version is the fresh
    /// tracker snapshot joined with the key's stored version, taken in the
    /// same step that installs the write, so a local write always lands.
    /// Returns the update that was applied (and, on the leader, fanned out).
    ///
    /// Must be called from within a Tokio runtime when peers are configured.
    pub fn local_write(&self, key: &str, value: Option<String>) -> Update {
        let snapshot = {
            let mut tracker = self
                .tracker
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            tracker.increment(&self.node_id);
            tracker.snapshot()
        };

        let version = self.store.apply_local(key, value.clone(), snapshot);
        let update = Update::new(key, value, version);
        tracing::debug!("Local write '{}' stamped {:?}", key, update.version);

        if self.is_leader {
            self.fan_out(&update);
        }

        update
    }

    pub fn put(&self, key: &str, value: String) -> Update {
        self.local_write(key, Some(value))
    }

    pub fn delete(&self, key: &str) -> Update {
        self.local_write(key, None)
    }

    /// Merges an update received from a peer.
    ///
    /// Returns whether it replaced the stored entry. Being ignored is the
    /// normal outcome of a stale or duplicate delivery.
    pub fn remote_update(&self, update: Update) -> bool {
        let applied = self.apply(&update);
        if applied {
            tracing::debug!("Remote update '{}' applied", update.key);
        } else {
            tracing::debug!(
                "Remote update '{}' ignored (version {:?} already covered)",
                update.key,
                update.version
            );
        }
        applied
    }

    pub fn read(&self, key: &str) -> GetResponse {
        GetResponse::from_value(self.store.get(key))
    }

    fn apply(&self, update: &Update) -> bool {
        let entry = update.to_entry(self.store.now_ms());
        self.store.apply_if_newer(&update.key, entry)
    }

    /// Dispatches one delivery task per peer and returns immediately.
    fn fan_out(&self, update: &Update) {
        if self.peers.is_empty() {
            return;
        }

        let update = Arc::new(update.clone());
        let mut deliveries = self
            .deliveries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Reap finished deliveries so the set only holds in-flight work.
        while deliveries.try_join_next().is_some() {}

        for peer in &self.peers {
            let peer = peer.clone();
            let update = update.clone();
            let transport = self.transport.clone();
            let timeout = self.delivery_timeout;

            deliveries.spawn(async move {
                match tokio::time::timeout(timeout, transport.deliver(&peer, &update)).await {
                    Ok(Ok(())) => {
                        tracing::debug!("Delivered '{}' to {}", update.key, peer);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Failed to notify peer {}: {}", peer, e);
                    }
                    Err(_) => {
                        tracing::warn!(
                            "Failed to notify peer {}: timed out after {:?}",
                            peer,
                            timeout
                        );
                    }
                }
            });
        }
    }

    /// Number of deliveries not yet reaped.
    pub fn pending_deliveries(&self) -> usize {
        let mut deliveries = self
            .deliveries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while deliveries.try_join_next().is_some() {}
        deliveries.len()
    }

    /// Waits up to `grace` for in-flight deliveries, then aborts the rest.
    ///
    /// Returns how many deliveries were aborted.
    pub async fn drain_deliveries(&self, grace: Duration) -> usize {
        let mut in_flight = {
            let mut deliveries = self
                .deliveries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *deliveries)
        };

        if in_flight.is_empty() {
            return 0;
        }

        tracing::info!("Draining {} peer deliveries", in_flight.len());

        let drained = tokio::time::timeout(grace, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;

        if drained.is_ok() {
            return 0;
        }

        let aborted = in_flight.len();
        tracing::warn!("Aborting {} peer deliveries after {:?}", aborted, grace);
        in_flight.shutdown().await;
        aborted
    }
}
