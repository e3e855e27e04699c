//! Peer Module
//!
//! Capabilities a group needs to route loads to the peer owning a key.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PeerError;
use crate::models::wire;

// == Peer Picker ==
/// Resolves which remote peer owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the owner of `key`, or `None` when the key should be served
    /// locally (no peers, or this process owns it).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

// == Peer Getter ==
/// Client for one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Fetches `request.key` from the peer's `request.group`.
    async fn get(&self, request: &wire::Request) -> Result<wire::Response, PeerError>;
}
