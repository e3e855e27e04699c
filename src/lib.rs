//! Peercache - A distributed read-through byte cache
//!
//! Every node owns a shard of the key space, picked by consistent hashing,
//! and fetches the rest from the owning peer over HTTP. Misses are coalesced
//! per key and filled from a pluggable loader.

pub mod cache;
pub mod config;
pub mod consistent_hash;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod singleflight;
pub mod transport;

pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, PeerError};
pub use group::{Group, GroupRegistry, Loader, LoaderFn};
pub use transport::{create_router, AppState, HttpPool};
