//! Cache Module
//!
//! Provides the byte-bounded LRU cache each group keeps for its share of keys.

mod byteview;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use lru::{EvictionCallback, LruCache};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Sized Value ==
/// A value that knows how many bytes it occupies in the cache.
pub trait SizedValue {
    fn size(&self) -> usize;
}

impl SizedValue for String {
    fn size(&self) -> usize {
        self.len()
    }
}

impl SizedValue for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }
}
