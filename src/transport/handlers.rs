//! Peer Server Handlers
//!
//! HTTP request handlers answering other peers and operators.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{wire, HealthResponse, StatsResponse};
use crate::transport::HttpPool;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Groups this node serves
    pub registry: Arc<GroupRegistry>,
    /// This node's view of the peer set
    pub pool: Arc<HttpPool>,
}

impl AppState {
    pub fn new(registry: Arc<GroupRegistry>, pool: Arc<HttpPool>) -> Self {
        Self { registry, pool }
    }
}

/// Logs every inbound request before it is routed.
pub async fn log_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    info!(
        server = %state.pool.self_addr(),
        method = %request.method(),
        path = %request.uri().path(),
        "inbound request"
    );
    next.run(request).await
}

/// Handler for GET <basepath>:group/:key
///
/// Answers a peer with the protobuf-encoded value of `key` in `group`.
pub async fn peer_handler(
    State(state): State<AppState>,
    Path((group_name, key)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response> {
    if group_name.is_empty() || key.is_empty() {
        return Err(CacheError::InvalidPath(uri.path().to_string()));
    }

    let group = state
        .registry
        .get_group(&group_name)
        .ok_or(CacheError::GroupNotFound(group_name))?;

    let value = group.get(&key).await?;
    let body = wire::Response::new(value.to_vec()).to_bytes();

    Ok(([(header::CONTENT_TYPE, wire::CONTENT_TYPE)], body).into_response())
}

/// Fallback for every path that is not a peer request or an operational endpoint.
pub async fn invalid_path_handler(uri: Uri) -> CacheError {
    CacheError::InvalidPath(uri.path().to_string())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let groups = state
        .registry
        .groups()
        .iter()
        .map(|group| group.stats())
        .collect();

    Json(StatsResponse::new(state.pool.self_addr(), groups))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
