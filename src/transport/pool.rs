//! HTTP Peer Pool
//!
//! Tracks peer membership and picks the peer owning each key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::consistent_hash::{HashFn, HashRing};
use crate::error::PeerError;
use crate::peers::{PeerGetter, PeerPicker};
use crate::transport::HttpGetter;

/// Path prefix under which peers serve each other.
pub const DEFAULT_BASE_PATH: &str = "/_peercache/";

/// Virtual nodes per peer on the ring.
pub const DEFAULT_REPLICAS: usize = 10;

/// Upper bound on one peer fetch before falling back to the loader.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// == Pool Options ==
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Prefix of every peer request path, with leading and trailing `/`
    pub base_path: String,
    pub replicas: usize,
    /// Peer request timeout
    pub timeout: Duration,
    /// Ring hash, `None` = CRC-32C
    pub hash: Option<HashFn>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            timeout: DEFAULT_TIMEOUT,
            hash: None,
        }
    }
}

/// Ring and clients, always replaced together.
struct Membership {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Peer set of one node.
///
/// Acts as the group's `PeerPicker` and, through `transport::create_router`,
/// answers the requests other nodes route here.
pub struct HttpPool {
    /// This node's own address, as listed in the peer set
    self_addr: String,
    options: PoolOptions,
    client: reqwest::Client,
    membership: Mutex<Membership>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool with default options and no peers.
    pub fn new(self_addr: impl Into<String>) -> Result<Self, PeerError> {
        Self::with_options(self_addr, PoolOptions::default())
    }

    pub fn with_options(
        self_addr: impl Into<String>,
        mut options: PoolOptions,
    ) -> Result<Self, PeerError> {
        let self_addr: String = self_addr.into();
        options.base_path = normalize_base_path(&options.base_path);
        let client = reqwest::Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            self_addr: normalize_addr(&self_addr),
            membership: Mutex::new(Membership {
                ring: HashRing::new(options.replicas, options.hash),
                getters: HashMap::new(),
            }),
            options,
            client,
        })
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.options.base_path
    }

    // == Set ==
    /// Replaces the peer set, rebuilding the ring and per-peer clients.
    ///
    /// The list should include this node's own address so keys it owns
    /// stay local. Addresses are compared without trailing `/`.
    pub fn set<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers
            .into_iter()
            .map(|peer| normalize_addr(peer.as_ref()))
            .collect();

        let mut ring = HashRing::new(self.options.replicas, self.options.hash);
        ring.add(&peers);
        let getters = peers
            .iter()
            .map(|peer| {
                let base_url = format!("{peer}{}", self.options.base_path);
                (peer.clone(), Arc::new(HttpGetter::new(base_url, self.client.clone())))
            })
            .collect();

        *self.membership.lock() = Membership { ring, getters };
        info!(server = %self.self_addr, peers = ?peers, "peer set updated");
    }

    /// Current peer addresses, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.membership.lock().getters.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Returns the peer address owning `key`, including this node itself.
    pub fn owner_of(&self, key: &str) -> Option<String> {
        self.membership.lock().ring.get(key).map(str::to_string)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let membership = self.membership.lock();
        let peer = membership.ring.get(key)?;
        // Never route a key back to ourselves
        if peer.is_empty() || peer == self.self_addr {
            return None;
        }

        debug!(server = %self.self_addr, peer, key, "picked peer");
        let getter = membership.getters.get(peer)?;
        Some(Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("options", &self.options)
            .finish()
    }
}

fn normalize_addr(addr: &str) -> String {
    addr.trim().trim_end_matches('/').to_string()
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Places "{i}{peer}" at the integer it spells.
    fn parse_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data).unwrap().parse().unwrap()
    }

    fn numeric_pool(self_addr: &str) -> HttpPool {
        let options = PoolOptions {
            replicas: 3,
            hash: Some(parse_hash),
            ..Default::default()
        };
        let pool = HttpPool::with_options(self_addr, options).unwrap();
        // Virtual nodes: 2, 4, 6, 12, 14, 16, 22, 24, 26
        pool.set(["2", "4", "6"]);
        pool
    }

    #[test]
    fn test_pick_remote_owner() {
        let pool = numeric_pool("2");

        assert!(pool.pick_peer("23").is_some());
        assert_eq!(pool.owner_of("23").as_deref(), Some("4"));
    }

    #[test]
    fn test_pick_self_owned_key_is_local() {
        let pool = numeric_pool("2");

        assert_eq!(pool.owner_of("11").as_deref(), Some("2"));
        assert!(pool.pick_peer("11").is_none());
        assert!(pool.pick_peer("27").is_none());
    }

    #[test]
    fn test_pick_without_peers() {
        let pool = HttpPool::new("http://localhost:9091").unwrap();
        assert!(pool.pick_peer("Tom").is_none());
        assert!(pool.pick_peer("").is_none());
    }

    #[test]
    fn test_set_replaces_membership() {
        let pool = numeric_pool("2");
        pool.set(["8"]);

        assert_eq!(pool.peers(), vec!["8"]);
        assert_eq!(pool.owner_of("11").as_deref(), Some("8"));
        assert!(pool.pick_peer("11").is_some());
    }

    #[test]
    fn test_getter_base_url() {
        let pool = HttpPool::new("http://localhost:9091").unwrap();
        pool.set(["http://localhost:9091", "http://localhost:9092/"]);

        let membership = pool.membership.lock();
        assert_eq!(
            membership.getters["http://localhost:9092"].base_url(),
            "http://localhost:9092/_peercache/"
        );
    }

    #[test]
    fn test_trailing_slash_still_matches_self() {
        let pool = HttpPool::new("http://127.0.0.1:9091").unwrap();
        pool.set(["http://127.0.0.1:9091/"]);

        assert_eq!(pool.self_addr(), "http://127.0.0.1:9091");
        assert_eq!(pool.peers(), vec!["http://127.0.0.1:9091"]);
        for key in ["Tom", "Jack", "Sam"] {
            assert_eq!(pool.owner_of(key).as_deref(), Some("http://127.0.0.1:9091"));
            assert!(pool.pick_peer(key).is_none());
        }

        let pool = HttpPool::new("http://127.0.0.1:9091/").unwrap();
        pool.set(["http://127.0.0.1:9091"]);
        assert!(pool.pick_peer("Tom").is_none());
    }

    #[test]
    fn test_normalize_addr() {
        assert_eq!(normalize_addr("http://h:1/"), "http://h:1");
        assert_eq!(normalize_addr(" http://h:1// "), "http://h:1");
        assert_eq!(normalize_addr("http://h:1"), "http://h:1");
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/_peercache/"), "/_peercache/");
        assert_eq!(normalize_base_path("_peercache"), "/_peercache/");
        assert_eq!(normalize_base_path(""), "/");
    }
}
