//! Message models for the cache server
//!
//! `wire` holds the binary messages exchanged between peers; `responses`
//! holds the JSON bodies of the operational endpoints.

pub mod responses;
pub mod wire;

// Re-export commonly used types
pub use responses::{HealthResponse, StatsResponse};
