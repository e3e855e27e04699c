//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::transport::pool::{PoolOptions, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// This node's base address, as other peers reach it
    pub self_addr: String,
    /// Every node's base address, this one included
    pub peers: Vec<String>,
    /// Name of the group this node serves
    pub group_name: String,
    /// Byte budget of the group's local cache
    pub cache_bytes: usize,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// Peer fetch timeout in seconds
    pub peer_timeout: u64,
    /// Path prefix of peer requests
    pub base_path: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SELF_ADDR` - This node's address (default: http://localhost:9091)
    /// - `PEER_ADDRS` - Comma-separated peer addresses (default: `SELF_ADDR`)
    /// - `GROUP_NAME` - Served group (default: scores)
    /// - `CACHE_BYTES` - Local cache budget in bytes (default: 2048)
    /// - `RING_REPLICAS` - Virtual nodes per peer (default: 10)
    /// - `PEER_TIMEOUT` - Peer fetch timeout in seconds (default: 5)
    /// - `BASE_PATH` - Peer request path prefix (default: /_peercache/)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let self_addr = env::var("SELF_ADDR").unwrap_or(defaults.self_addr);

        let peers = env::var("PEER_ADDRS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_addr.clone()]);

        Self {
            self_addr,
            peers,
            group_name: env::var("GROUP_NAME").unwrap_or(defaults.group_name),
            cache_bytes: env::var("CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_bytes),
            replicas: env::var("RING_REPLICAS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.replicas),
            peer_timeout: env::var("PEER_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.peer_timeout),
            base_path: env::var("BASE_PATH").unwrap_or(defaults.base_path),
        }
    }

    /// Returns the `host:port` to listen on, taken from `self_addr`.
    ///
    /// Falls back to treating `self_addr` as a bare `host:port`.
    pub fn listen_addr(&self) -> String {
        match Url::parse(&self.self_addr) {
            Ok(url) => match (url.host_str(), url.port_or_known_default()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                _ => self.self_addr.clone(),
            },
            Err(_) => self.self_addr.clone(),
        }
    }

    /// Peer pool settings derived from this config.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            base_path: self.base_path.clone(),
            replicas: self.replicas,
            timeout: Duration::from_secs(self.peer_timeout),
            hash: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            self_addr: "http://localhost:9091".to_string(),
            peers: vec!["http://localhost:9091".to_string()],
            group_name: "scores".to_string(),
            cache_bytes: 2 << 10,
            replicas: DEFAULT_REPLICAS,
            peer_timeout: 5,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}
