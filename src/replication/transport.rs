//! Peer Delivery Transport
//!
//! The engine only knows the [`PeerTransport`] seam; the HTTP implementation
//! posts the JSON-encoded [`Update`] to the peer's `/update` endpoint.

use super::protocol::{ENDPOINT_UPDATE, Update};
use crate::error::CacheError;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Largest sleep between two attempts, jitter included.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(1250);

/// Boxed delivery future, so transports can live behind `Arc<dyn PeerTransport>`.
pub type DeliveryFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>>;

/// Sends one update to one peer.
///
/// Implementations report failure; they never retry forever and never
/// panic. The engine decides what a failure means (it logs and drops it).
pub trait PeerTransport: Send + Sync {
    fn deliver<'a>(&'a self, peer: &'a str, update: &'a Update) -> DeliveryFuture<'a>;
}

/// JSON-over-HTTP delivery with a per-attempt timeout and bounded retries.
pub struct HttpPeerTransport {
    http_client: reqwest::Client,
    timeout: Duration,
    attempts: usize,
}

impl HttpPeerTransport {
    pub fn new(timeout: Duration, attempts: usize) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
            attempts: attempts.max(1),
        }
    }

    /// Resolves a configured peer (`host:port` or base URL) to its update URL.
    pub fn update_url(peer: &str) -> String {
        let base = peer.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}{}", base, ENDPOINT_UPDATE)
        } else {
            format!("http://{}{}", base, ENDPOINT_UPDATE)
        }
    }

    /// Worst-case wall time of one delivery: every attempt timing out plus
    /// the longest backoff between them.
    pub fn delivery_budget(timeout: Duration, attempts: usize) -> Duration {
        let attempts = u32::try_from(attempts.max(1)).unwrap_or(u32::MAX);
        timeout
            .saturating_mul(attempts)
            .saturating_add(MAX_RETRY_BACKOFF.saturating_mul(attempts - 1))
    }

    async fn post_with_retry(&self, peer: &str, update: &Update) -> Result<(), CacheError> {
        let url = Self::update_url(peer);
        let mut delay_ms = 150u64;

        for attempt in 0..self.attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(update)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    return Err(CacheError::PeerRejected {
                        peer: peer.to_string(),
                        status: resp.status().as_u16(),
                    });
                }
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(self.classify(peer, e));
                    }
                    tracing::debug!(
                        "Delivery attempt {} to {} failed: {}",
                        attempt + 1,
                        peer,
                        e
                    );
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(CacheError::DeliveryTimeout {
            peer: peer.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        })
    }

    fn classify(&self, peer: &str, e: reqwest::Error) -> CacheError {
        if e.is_timeout() {
            CacheError::DeliveryTimeout {
                peer: peer.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            CacheError::Transport {
                peer: peer.to_string(),
                source: e,
            }
        }
    }
}

impl PeerTransport for HttpPeerTransport {
    fn deliver<'a>(&'a self, peer: &'a str, update: &'a Update) -> DeliveryFuture<'a> {
        Box::pin(self.post_with_retry(peer, update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_url_from_host_port() {
        assert_eq!(
            HttpPeerTransport::update_url("10.0.0.2:8080"),
            "http://10.0.0.2:8080/update"
        );
    }

    #[test]
    fn test_update_url_from_base_url() {
        assert_eq!(
            HttpPeerTransport::update_url("https://cache-b.internal/"),
            "https://cache-b.internal/update"
        );
    }

    #[test]
    fn test_delivery_budget_covers_retries() {
        let timeout = Duration::from_millis(500);

        assert_eq!(HttpPeerTransport::delivery_budget(timeout, 0), timeout);
        assert_eq!(HttpPeerTransport::delivery_budget(timeout, 1), timeout);
        assert_eq!(
            HttpPeerTransport::delivery_budget(timeout, 3),
            timeout * 3 + MAX_RETRY_BACKOFF * 2
        );
    }

    #[test]
    fn test_delivery_budget_saturates_on_huge_attempt_counts() {
        let budget = HttpPeerTransport::delivery_budget(Duration::from_secs(2), usize::MAX);
        assert_eq!(budget, Duration::MAX);
    }

    #[tokio::test]
    async fn test_unreachable_peer_reports_error() {
        let transport = HttpPeerTransport::new(Duration::from_millis(200), 1);
        let update = Update::new("k", Some("v".to_string()), Default::default());

        // Port 1 on loopback refuses connections.
        let result = transport.deliver("127.0.0.1:1", &update).await;

        assert!(result.is_err());
    }
}
