//! Group Module
//!
//! Cache-aside orchestration: a named cache backed by a loader, optionally
//! sharded across peers.

mod loader;
mod registry;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheStats, CacheStore};
use crate::error::{CacheError, PeerError, Result};
use crate::models::wire;
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::Flight;

pub use loader::{Loader, LoaderFn};
pub use registry::GroupRegistry;

/// Load path counters, bumped without taking the cache lock.
#[derive(Debug, Default)]
struct LoadCounters {
    peer_loads: AtomicU64,
    peer_failures: AtomicU64,
    local_loads: AtomicU64,
    load_errors: AtomicU64,
}

// == Group Stats ==
/// Point-in-time view of a group's cache and load path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub name: String,
    pub cache: CacheStats,
    /// Misses answered by the owning peer
    pub peer_loads: u64,
    /// Peer fetches that failed and fell back to the loader
    pub peer_failures: u64,
    /// Misses answered by the local loader
    pub local_loads: u64,
    /// Loader failures returned to callers
    pub load_errors: u64,
}

// == Group ==
/// A named cache namespace.
///
/// `get` answers from the local cache when it can. On a miss, concurrent
/// callers for the same key share one load: the owning peer is asked first
/// when peers are registered, and the local loader is used when no remote
/// peer owns the key or the peer fetch fails. Only locally loaded values are
/// cached here; a remote owner caches its own share.
pub struct Group {
    name: String,
    main_cache: CacheStore,
    loader: Arc<dyn Loader>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: Flight<Result<ByteView>>,
    counters: LoadCounters,
}

impl Group {
    // == Constructor ==
    /// Creates a group whose local cache holds at most `cache_bytes`
    /// (0 = unbounded). Use `GroupRegistry::new_group` to make it reachable
    /// by name.
    pub fn new(name: impl Into<String>, cache_bytes: usize, loader: Arc<dyn Loader>) -> Self {
        Self {
            name: name.into(),
            main_cache: CacheStore::new(cache_bytes),
            loader,
            peers: OnceLock::new(),
            flight: Flight::new(),
            counters: LoadCounters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Register Peers ==
    /// Attaches the peer picker used to route misses.
    ///
    /// A group takes exactly one picker. A second call is a setup bug and
    /// fails with `PeersAlreadyRegistered`; callers should abort startup.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.peers
            .set(peers)
            .map_err(|_| CacheError::PeersAlreadyRegistered(self.name.clone()))
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(value) = self.main_cache.get(key) {
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .work(key, || async {
                if let Some(peer) = self.peers.get().and_then(|picker| picker.pick_peer(key)) {
                    match self.get_from_peer(peer.as_ref(), key).await {
                        Ok(value) => {
                            self.counters.peer_loads.fetch_add(1, Ordering::Relaxed);
                            return Ok(value);
                        }
                        Err(err) => {
                            self.counters.peer_failures.fetch_add(1, Ordering::Relaxed);
                            warn!(group = %self.name, key, error = %err, "failed to get from peer, loading locally");
                        }
                    }
                }

                self.get_locally(key).await
            })
            .await
    }

    async fn get_from_peer(
        &self,
        peer: &dyn PeerGetter,
        key: &str,
    ) -> std::result::Result<ByteView, PeerError> {
        let request = wire::Request::new(self.name.as_str(), key);
        let response = peer.get(&request).await?;
        Ok(ByteView::from(response.value))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = match self.loader.load(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.counters.load_errors.fetch_add(1, Ordering::Relaxed);
                return Err(CacheError::load(err));
            }
        };

        info!(group = %self.name, key, bytes = bytes.len(), "loaded locally");
        self.counters.local_loads.fetch_add(1, Ordering::Relaxed);

        let value = ByteView::new(&bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value);
    }

    // == Stats ==
    pub fn stats(&self) -> GroupStats {
        GroupStats {
            name: self.name.clone(),
            cache: self.main_cache.stats(),
            peer_loads: self.counters.peer_loads.load(Ordering::Relaxed),
            peer_failures: self.counters.peer_failures.load(Ordering::Relaxed),
            local_loads: self.counters.local_loads.load(Ordering::Relaxed),
            load_errors: self.counters.load_errors.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("main_cache", &self.main_cache)
            .field("has_peers", &self.peers.get().is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn db() -> HashMap<&'static str, &'static str> {
        HashMap::from([("test1", "val1"), ("test2", "val2"), ("test3", "val3")])
    }

    /// Loader over `db()` that counts invocations per key.
    #[derive(Default)]
    struct CountingLoader {
        counts: Mutex<HashMap<String, usize>>,
        delay: Option<Duration>,
    }

    impl CountingLoader {
        fn count(&self, key: &str) -> usize {
            self.counts.lock().get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Loader for CountingLoader {
        async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
            *self.counts.lock().entry(key.to_string()).or_default() += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            db().get(key)
                .map(|v| v.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("{key} is not existed"))
        }
    }

    /// Peer that answers from a fixed value or fails like a dead host.
    struct FakePeer {
        value: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerGetter for FakePeer {
        async fn get(
            &self,
            request: &wire::Request,
        ) -> std::result::Result<wire::Response, PeerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.group, "scores");
            match self.value {
                Some(value) => Ok(wire::Response::new(value.as_bytes().to_vec())),
                None => Err(PeerError::Status {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: "connection refused".to_string(),
                }),
            }
        }
    }

    /// Routes every key to one peer.
    struct FixedPicker(Arc<FakePeer>);

    impl PeerPicker for FixedPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            let peer: Arc<dyn PeerGetter> = self.0.clone();
            Some(peer)
        }
    }

    /// Claims every key for this process.
    struct SelfPicker;

    impl PeerPicker for SelfPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            None
        }
    }

    fn peer(value: Option<&'static str>) -> Arc<FakePeer> {
        Arc::new(FakePeer {
            value,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_get_loads_once_then_hits_cache() {
        let loader = Arc::new(CountingLoader::default());
        let group = Group::new("scores", 2 << 10, loader.clone());

        for (key, value) in db() {
            let first = group.get(key).await.unwrap();
            let second = group.get(key).await.unwrap();
            assert_eq!(first.to_string(), value);
            assert_eq!(first, second);
            assert_eq!(loader.count(key), 1, "key {key} loaded more than once");
        }

        let stats = group.stats();
        assert_eq!(stats.local_loads, 3);
        assert_eq!(stats.cache.hits, 3);
        assert_eq!(stats.cache.misses, 3);
    }

    #[tokio::test]
    async fn test_get_empty_key() {
        let group = Group::new("scores", 0, Arc::new(CountingLoader::default()));
        assert!(matches!(group.get("").await, Err(CacheError::EmptyKey)));
    }

    #[tokio::test]
    async fn test_loader_error_propagates_and_is_not_cached() {
        let loader = Arc::new(CountingLoader::default());
        let group = Group::new("scores", 0, loader.clone());

        let err = group.get("unknown").await.unwrap_err();
        assert_eq!(err.to_string(), "unknown is not existed");

        assert!(group.get("unknown").await.is_err());
        assert_eq!(loader.count("unknown"), 2);
        assert_eq!(group.stats().load_errors, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_load() {
        let loader = Arc::new(CountingLoader {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let group = Arc::new(Group::new("scores", 0, loader.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let group = Arc::clone(&group);
                tokio::spawn(async move { group.get("test2").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().to_string(), "val2");
        }
        assert_eq!(loader.count("test2"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_error() {
        let loader = Arc::new(CountingLoader {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let group = Arc::new(Group::new("scores", 0, loader.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let group = Arc::clone(&group);
                tokio::spawn(async move { group.get("x").await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, CacheError::Load(_)));
            assert_eq!(err.to_string(), "x is not existed");
        }
        assert_eq!(loader.count("x"), 1);
        assert_eq!(group.stats().load_errors, 1);
    }

    #[tokio::test]
    async fn test_remote_value_is_not_cached_locally() {
        let loader = Arc::new(CountingLoader::default());
        let group = Group::new("scores", 0, loader.clone());
        let remote = peer(Some("remote"));
        group
            .register_peers(Arc::new(FixedPicker(remote.clone())))
            .unwrap();

        assert_eq!(group.get("test1").await.unwrap().to_string(), "remote");
        assert_eq!(group.get("test1").await.unwrap().to_string(), "remote");

        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
        assert_eq!(loader.count("test1"), 0);
        assert_eq!(group.stats().cache.total_entries, 0);
        assert_eq!(group.stats().peer_loads, 2);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_loader() {
        let loader = Arc::new(CountingLoader::default());
        let group = Group::new("scores", 0, loader.clone());
        let dead = peer(None);
        group.register_peers(Arc::new(FixedPicker(dead.clone()))).unwrap();

        assert_eq!(group.get("test3").await.unwrap().to_string(), "val3");
        assert_eq!(loader.count("test3"), 1);

        // Populated from the loader, so the next read never reaches the peer
        assert_eq!(group.get("test3").await.unwrap().to_string(), "val3");
        assert_eq!(dead.calls.load(Ordering::SeqCst), 1);

        let stats = group.stats();
        assert_eq!(stats.peer_failures, 1);
        assert_eq!(stats.cache.total_entries, 1);
    }

    #[tokio::test]
    async fn test_self_owned_key_loads_locally() {
        let loader = Arc::new(CountingLoader::default());
        let group = Group::new("scores", 0, loader.clone());
        group.register_peers(Arc::new(SelfPicker)).unwrap();

        assert_eq!(group.get("test1").await.unwrap().to_string(), "val1");
        assert_eq!(loader.count("test1"), 1);
    }

    #[test]
    fn test_register_peers_twice_fails() {
        let group = Group::new("scores", 0, Arc::new(CountingLoader::default()));

        assert!(group.register_peers(Arc::new(SelfPicker)).is_ok());
        assert!(matches!(
            group.register_peers(Arc::new(SelfPicker)),
            Err(CacheError::PeersAlreadyRegistered(name)) if name == "scores"
        ));
    }
}
