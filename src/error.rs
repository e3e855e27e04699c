//! Error types for the cache engine and its peer transport
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced by groups and by the peer server.
///
/// Cloneable so a single load outcome can be handed to every coalesced caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Lookup with an empty key
    #[error("key is required")]
    EmptyKey,

    /// The group's loader failed; displayed exactly as the loader reported it
    #[error("{0}")]
    Load(Arc<anyhow::Error>),

    /// A peer picker was attached to a group that already has one
    #[error("peers already registered for group {0}")]
    PeersAlreadyRegistered(String),

    /// Inbound peer request path is not `<basepath><group>/<key>`
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// Inbound peer request names a group this process does not serve
    #[error("cache group not found: {0}")]
    GroupNotFound(String),
}

impl CacheError {
    /// Wraps a loader failure.
    pub fn load(err: anyhow::Error) -> Self {
        CacheError::Load(Arc::new(err))
    }

    /// HTTP status used when this error answers a peer request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::EmptyKey | CacheError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Load(_) | CacheError::PeersAlreadyRegistered(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        // Peers read the error text as a plain body
        (self.status_code(), self.to_string()).into_response()
    }
}

// == Peer Error Enum ==
/// Failure talking to a remote peer. Never reaches `Group::get` callers;
/// the load path logs it and falls back to the local loader.
#[derive(Error, Debug)]
pub enum PeerError {
    /// Connection, timeout or body read failure
    #[error("peer transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Peer answered with a non-success status
    #[error("peer returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body was not a valid wire response
    #[error("decoding peer response: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Peer base address could not be turned into a request URL
    #[error("invalid peer url: {0}")]
    Url(#[from] url::ParseError),

    /// Peer base address cannot carry path segments (e.g. `mailto:`)
    #[error("peer address cannot be a base url: {0}")]
    CannotBeABase(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
