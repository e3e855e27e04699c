//! Response DTOs for the operational endpoints
//!
//! Defines the JSON bodies served next to the peer protocol.

use serde::Serialize;

use crate::group::GroupStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Address this node serves peers on
    pub node: String,
    /// One entry per registered group, sorted by name
    pub groups: Vec<GroupStats>,
}

impl StatsResponse {
    pub fn new(node: impl Into<String>, groups: Vec<GroupStats>) -> Self {
        Self {
            node: node.into(),
            groups,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
