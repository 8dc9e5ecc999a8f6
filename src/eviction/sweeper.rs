//! Eviction Sweeper
//!
//! Periodically purges expired entries from the [`VersionedStore`]. The
//! sweeper is started and stopped explicitly by the node lifecycle; nothing
//! runs as a side effect of construction or drop.

use crate::storage::VersionedStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct EvictionSweeper {
    store: Arc<VersionedStore>,
    interval: Duration,
}

impl EvictionSweeper {
    /// Sweeper ticking every `ttl / 2` of the store.
    pub fn new(store: Arc<VersionedStore>) -> Self {
        let interval = (store.ttl() / 2).max(Duration::from_millis(1));
        Self::with_interval(store, interval)
    }

    pub fn with_interval(store: Arc<VersionedStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single sweep against the store's clock.
    pub fn sweep_once(&self) -> usize {
        sweep(&self.store)
    }

    /// Spawns the periodic task and returns its handle.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let evicted_total = Arc::new(AtomicU64::new(0));
        let total = evicted_total.clone();

        tracing::info!("Starting eviction sweeper (every {:?})", self.interval);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // The first tick fires immediately; there is nothing to expire yet.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = sweep(&self.store);
                        total.fetch_add(removed as u64, Ordering::Relaxed);
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Eviction sweeper shutting down");
                        break;
                    }
                }
            }
        });

        SweeperHandle {
            shutdown_tx,
            task,
            evicted_total,
        }
    }
}

fn sweep(store: &VersionedStore) -> usize {
    let removed = store.sweep_expired(store.now_ms());
    if removed > 0 {
        tracing::info!(
            "Evicted {} expired entries ({} remaining)",
            removed,
            store.len()
        );
    } else {
        tracing::trace!("Sweep found nothing to evict");
    }
    removed
}

/// Control handle of a running sweeper.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    evicted_total: Arc<AtomicU64>,
}

impl SweeperHandle {
    /// Total entries evicted since start.
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signals the sweeper to stop and waits up to `grace` for an in-flight
    /// sweep to finish before aborting the task.
    ///
    /// Returns `true` when the task stopped on its own.
    pub async fn stop(self, grace: Duration) -> bool {
        let _ = self.shutdown_tx.send(true);
        let mut task = self.task;

        match tokio::time::timeout(grace, &mut task).await {
            Ok(_) => {
                tracing::info!("Eviction sweeper stopped");
                true
            }
            Err(_) => {
                tracing::warn!("Eviction sweeper did not stop within {:?}, aborting", grace);
                task.abort();
                false
            }
        }
    }
}
