//! Peer Server Routes
//!
//! Configures the Axum router peers and operators talk to.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, invalid_path_handler, log_request, peer_handler, stats_handler, AppState,
};

/// Creates the router for one node.
///
/// # Endpoints
/// - `GET <basepath>:group/:key` - Protobuf-encoded value for a peer
/// - `GET /stats` - Per-group cache and load statistics
/// - `GET /health` - Health check endpoint
///
/// Any other path is answered with 400.
pub fn create_router(state: AppState) -> Router {
    let peer_route = format!("{}:group/:key", state.pool.base_path());

    Router::new()
        .route(&peer_route, get(peer_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(invalid_path_handler)
        .layer(middleware::from_fn_with_state(state.clone(), log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
