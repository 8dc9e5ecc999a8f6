//! Node Configuration
//!
//! Read once from the environment at startup and never re-read. Parsing goes
//! through a lookup closure so tests can supply values without touching the
//! process environment.

use crate::error::CacheError;
use crate::node::types::NodeId;

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_PORT: &str = "PORT";
pub const ENV_PEER_NODES: &str = "PEER_NODES";
pub const ENV_CACHE_TTL_MS: &str = "CACHE_TTL_MS";
pub const ENV_IS_LEADER: &str = "IS_LEADER";
pub const ENV_NODE_ID: &str = "NODE_ID";
pub const ENV_PEER_TIMEOUT_MS: &str = "PEER_TIMEOUT_MS";
pub const ENV_PEER_RETRY_ATTEMPTS: &str = "PEER_RETRY_ATTEMPTS";
pub const ENV_SHUTDOWN_GRACE_MS: &str = "SHUTDOWN_GRACE_MS";

/// Upper bound on `PEER_RETRY_ATTEMPTS`.
pub const MAX_PEER_RETRY_ATTEMPTS: usize = 10;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub listen_addr: SocketAddr,
    /// `host:port` or full base URLs of the peers' HTTP interfaces.
    pub peers: Vec<String>,
    pub ttl: Duration,
    /// Explicit leader designation; see [`NodeConfig::is_leader`].
    pub leader: bool,
    pub peer_timeout: Duration,
    pub peer_retry_attempts: usize,
    pub shutdown_grace: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::new(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            peers: Vec::new(),
            ttl: Duration::from_secs(60),
            leader: false,
            peer_timeout: Duration::from_secs(2),
            peer_retry_attempts: 1,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, CacheError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CacheError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ip: IpAddr = parse_or(&lookup, ENV_BIND_ADDR, defaults.listen_addr.ip())?;
        let port: u16 = parse_or(&lookup, ENV_PORT, defaults.listen_addr.port())?;

        let peers = lookup(ENV_PEER_NODES)
            .map(|raw| parse_peer_list(&raw))
            .unwrap_or_default();

        let ttl_ms: u64 = parse_or(&lookup, ENV_CACHE_TTL_MS, defaults.ttl.as_millis() as u64)?;
        if ttl_ms == 0 {
            return Err(CacheError::InvalidConfig {
                key: ENV_CACHE_TTL_MS,
                value: ttl_ms.to_string(),
                reason: "TTL must be greater than zero".to_string(),
            });
        }

        let leader = match lookup(ENV_IS_LEADER) {
            Some(raw) => parse_bool(ENV_IS_LEADER, &raw)?,
            None => defaults.leader,
        };

        let node_id = lookup(ENV_NODE_ID)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(NodeId)
            .unwrap_or(defaults.node_id);

        let peer_timeout_ms: u64 = parse_or(
            &lookup,
            ENV_PEER_TIMEOUT_MS,
            defaults.peer_timeout.as_millis() as u64,
        )?;
        let peer_retry_attempts: usize =
            parse_or(&lookup, ENV_PEER_RETRY_ATTEMPTS, defaults.peer_retry_attempts)?;
        if peer_retry_attempts > MAX_PEER_RETRY_ATTEMPTS {
            return Err(CacheError::InvalidConfig {
                key: ENV_PEER_RETRY_ATTEMPTS,
                value: peer_retry_attempts.to_string(),
                reason: format!("at most {} attempts are allowed", MAX_PEER_RETRY_ATTEMPTS),
            });
        }
        let shutdown_grace_ms: u64 = parse_or(
            &lookup,
            ENV_SHUTDOWN_GRACE_MS,
            defaults.shutdown_grace.as_millis() as u64,
        )?;

        Ok(Self {
            node_id,
            listen_addr: SocketAddr::new(ip, port),
            peers,
            ttl: Duration::from_millis(ttl_ms),
            leader,
            peer_timeout: Duration::from_millis(peer_timeout_ms),
            peer_retry_attempts: peer_retry_attempts.max(1),
            shutdown_grace: Duration::from_millis(shutdown_grace_ms),
        })
    }

    /// Effective leadership: explicitly designated, or nobody to defer to.
    pub fn is_leader(&self) -> bool {
        self.leader || self.peers.is_empty()
    }
}

/// Splits a comma-separated peer list, dropping blanks.
pub fn parse_peer_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, CacheError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| CacheError::InvalidConfig {
                    key,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, CacheError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CacheError::InvalidConfig {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_make_a_standalone_leader() {
        let config = NodeConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert!(config.peers.is_empty());
        assert!(config.is_leader());
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.peer_retry_attempts, 1);
    }

    #[test]
    fn test_peer_list_drops_blanks() {
        let config = NodeConfig::from_lookup(lookup_from(&[(
            ENV_PEER_NODES,
            " 10.0.0.2:8080, ,10.0.0.3:8080,",
        )]))
        .unwrap();

        assert_eq!(config.peers, vec!["10.0.0.2:8080", "10.0.0.3:8080"]);
        assert!(!config.is_leader(), "peers without the flag means follower");
    }

    #[test]
    fn test_explicit_leader_with_peers() {
        let config = NodeConfig::from_lookup(lookup_from(&[
            (ENV_PEER_NODES, "b:8080"),
            (ENV_IS_LEADER, "true"),
            (ENV_PORT, "9001"),
            (ENV_CACHE_TTL_MS, "500"),
            (ENV_NODE_ID, "node-a"),
        ]))
        .unwrap();

        assert!(config.is_leader());
        assert_eq!(config.listen_addr.port(), 9001);
        assert_eq!(config.ttl, Duration::from_millis(500));
        assert_eq!(config.node_id, NodeId::from("node-a"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = NodeConfig::from_lookup(lookup_from(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        assert!(NodeConfig::from_lookup(lookup_from(&[(ENV_CACHE_TTL_MS, "0")])).is_err());
    }

    #[test]
    fn test_retry_attempts_are_bounded() {
        let config = NodeConfig::from_lookup(lookup_from(&[(ENV_PEER_RETRY_ATTEMPTS, "10")])).unwrap();
        assert_eq!(config.peer_retry_attempts, MAX_PEER_RETRY_ATTEMPTS);

        let err = NodeConfig::from_lookup(lookup_from(&[(ENV_PEER_RETRY_ATTEMPTS, "4294967296")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_PEER_RETRY_ATTEMPTS));

        assert!(NodeConfig::from_lookup(lookup_from(&[(ENV_PEER_RETRY_ATTEMPTS, "-1")])).is_err());
    }

    #[test]
    fn test_zero_retry_attempts_means_one() {
        let config = NodeConfig::from_lookup(lookup_from(&[(ENV_PEER_RETRY_ATTEMPTS, "0")])).unwrap();
        assert_eq!(config.peer_retry_attempts, 1);
    }

    #[test]
    fn test_invalid_leader_flag_is_rejected() {
        assert!(NodeConfig::from_lookup(lookup_from(&[(ENV_IS_LEADER, "maybe")])).is_err());
    }
}
