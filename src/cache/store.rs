//! Cache Store Module
//!
//! Mutex-guarded, lazily built LRU cache owned by a single group.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{ByteView, CacheStats, EvictionCallback, LruCache};

#[derive(Debug, Default)]
struct Inner {
    /// Built on first `add`
    lru: Option<LruCache<ByteView>>,
    stats: CacheStats,
}

// == Cache Store ==
/// Thread-safe cache of `ByteView`s.
///
/// A single exclusive lock guards everything, since reads reorder the
/// recency list too.
#[derive(Debug)]
pub struct CacheStore {
    /// Byte budget handed to the LRU when it is built, 0 = unbounded
    max_bytes: usize,
    inner: Mutex<Inner>,
    /// Bumped from the LRU eviction callback
    evictions: Arc<AtomicU64>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. Nothing is allocated until the first `add`.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner::default()),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    // == Add ==
    /// Stores a value, evicting least recently used entries as needed.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock();
        let evictions = &self.evictions;
        let lru = inner.lru.get_or_insert_with(|| {
            let counter = Arc::clone(evictions);
            let on_evicted: EvictionCallback<ByteView> = Box::new(move |_key: &str, _value: &ByteView| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
            LruCache::new(self.max_bytes, Some(on_evicted))
        });
        lru.add(key, value);
    }

    // == Get ==
    /// Looks up a value, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        let found = inner.lru.as_mut().and_then(|lru| lru.get(key).cloned());

        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        found
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.as_ref().map_or(0, LruCache::len)
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.evictions = self.evictions.load(Ordering::Relaxed);
        if let Some(lru) = inner.lru.as_ref() {
            stats.total_entries = lru.len();
            stats.total_bytes = lru.size_bytes();
        }
        stats
    }

    #[cfg(test)]
    fn is_allocated(&self) -> bool {
        self.inner.lock().lru.is_some()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_store_new_is_lazy() {
        let store = CacheStore::new(100);
        assert!(store.get("missing").is_none());
        assert!(!store.is_allocated());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_add_and_get() {
        let store = CacheStore::new(100);
        store.add("key1", ByteView::from("value1"));

        assert!(store.is_allocated());
        assert_eq!(store.get("key1"), Some(ByteView::from("value1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_evicts_and_counts() {
        // Room for two "kN" -> "vN" entries
        let store = CacheStore::new(8);
        store.add("k1", ByteView::from("v1"));
        store.add("k2", ByteView::from("v2"));
        store.add("k3", ByteView::from("v3"));

        assert!(store.get("k1").is_none());
        assert!(store.get("k3").is_some());

        let stats = store.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_bytes, 8);
    }

    #[test]
    fn test_store_stats_hits_and_misses() {
        let store = CacheStore::new(0);
        store.add("key1", ByteView::from("value1"));
        store.get("key1");
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_concurrent_access() {
        let store = Arc::new(CacheStore::new(0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("t{t}-k{i}");
                        store.add(&key, ByteView::from("v"));
                        assert!(store.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }
}
