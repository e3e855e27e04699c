//! Transport Module
//!
//! HTTP peer pool: the server side answering other peers and the client side
//! fetching from them.
//!
//! # Endpoints
//! - `GET <basepath>:group/:key` - Protobuf-encoded value for a peer
//! - `GET /stats` - Per-group cache and load statistics
//! - `GET /health` - Health check endpoint

pub mod client;
pub mod handlers;
pub mod pool;
pub mod routes;

pub use client::HttpGetter;
pub use handlers::AppState;
pub use pool::{HttpPool, PoolOptions};
pub use routes::create_router;
