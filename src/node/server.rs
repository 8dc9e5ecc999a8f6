//! Node Assembly
//!
//! Wires the store, the replication engine, the sweeper and the HTTP router
//! together and drives them through startup and shutdown.
//!
//! ## Shutdown order
//! 1. Stop accepting HTTP requests; in-flight requests get the grace window.
//! 2. Stop the eviction sweeper, waiting up to the grace window.
//! 3. Drain in-flight peer deliveries, aborting what is left after the window.

use crate::config::NodeConfig;
use crate::eviction::EvictionSweeper;
use crate::replication::handlers::{
    handle_delete, handle_get, handle_get_query, handle_put, handle_stats, handle_update,
};
use crate::replication::protocol::{
    ENDPOINT_DELETE, ENDPOINT_GET, ENDPOINT_PUT, ENDPOINT_STATS, ENDPOINT_UPDATE,
};
use crate::replication::{EngineConfig, HttpPeerTransport, PeerTransport, ReplicationEngine};
use crate::storage::{Clock, SystemClock, VersionedStore};

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Builds the HTTP interface over an engine.
pub fn router(engine: Arc<ReplicationEngine>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_DELETE, post(handle_delete))
        .route(ENDPOINT_GET, get(handle_get_query))
        .route(&format!("{}/:key", ENDPOINT_GET), get(handle_get))
        .route(ENDPOINT_UPDATE, post(handle_update))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(engine))
}

pub struct CacheNode {
    config: NodeConfig,
    engine: Arc<ReplicationEngine>,
}

impl CacheNode {
    /// Node with the wall clock and the HTTP peer transport.
    pub fn new(config: NodeConfig) -> Self {
        let transport = Arc::new(HttpPeerTransport::new(
            config.peer_timeout,
            config.peer_retry_attempts,
        ));
        Self::with_parts(config, Arc::new(SystemClock), transport)
    }

    pub fn with_parts(
        config: NodeConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let store = Arc::new(VersionedStore::with_clock(config.ttl, clock));

        // Retries happen inside one delivery; the engine bounds the total.
        let delivery_timeout =
            HttpPeerTransport::delivery_budget(config.peer_timeout, config.peer_retry_attempts);

        let engine = ReplicationEngine::new(
            EngineConfig {
                node_id: config.node_id.clone(),
                is_leader: config.is_leader(),
                peers: config.peers.clone(),
                delivery_timeout,
            },
            store,
            transport,
        );

        Self { config, engine }
    }

    pub fn engine(&self) -> &Arc<ReplicationEngine> {
        &self.engine
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let grace = self.config.shutdown_grace;
        let engine = self.engine.clone();

        tracing::info!(
            "Node {} listening on {} (leader={}, peers={:?}, ttl={:?})",
            engine.node_id(),
            listener.local_addr()?,
            engine.is_leader(),
            engine.peers(),
            self.config.ttl
        );

        let sweeper = EvictionSweeper::new(engine.store().clone()).start();

        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = spawn_stats_reporter(engine.clone(), stop_rx.clone());

        let app = router(engine.clone());
        let mut server_stop = stop_rx;
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_stop.changed().await;
                })
                .await
        });

        let early_exit = tokio::select! {
            result = &mut server => Some(result),
            _ = shutdown => None,
        };

        tracing::info!("Shutting down node {}", engine.node_id());
        let _ = stop_tx.send(true);

        let served = match early_exit {
            Some(result) => result,
            None => match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("HTTP drain exceeded {:?}, aborting open connections", grace);
                    server.abort();
                    Ok(Ok(()))
                }
            },
        };

        sweeper.stop(grace).await;
        let _ = stats.await;

        let aborted = engine.drain_deliveries(grace).await;
        if aborted > 0 {
            tracing::warn!("{} peer deliveries dropped at shutdown", aborted);
        }

        tracing::info!("Node {} stopped", engine.node_id());
        served??;
        Ok(())
    }
}

fn spawn_stats_reporter(
    engine: Arc<ReplicationEngine>,
    mut stop_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tracing::info!(
                        "Node stats: {} entries, {} pending deliveries (leader={})",
                        engine.store().len(),
                        engine.pending_deliveries(),
                        engine.is_leader()
                    );
                }
                _ = stop_rx.changed() => break,
            }
        }
    })
}
