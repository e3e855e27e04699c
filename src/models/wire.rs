//! Peer wire messages
//!
//! Protobuf-encoded request and response envelopes exchanged between peers.
//! Field tags are fixed so older and newer peers can still decode each other.

use prost::Message;

/// Content type of an encoded `Response` body.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Asks a peer for one key of one group.
#[derive(Clone, PartialEq, Message)]
pub struct Request {
    #[prost(string, tag = "1")]
    pub group: String,
    #[prost(string, tag = "2")]
    pub key: String,
}

impl Request {
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
        }
    }
}

/// A peer's answer: the cached bytes for the requested key.
#[derive(Clone, PartialEq, Message)]
pub struct Response {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
}

impl Response {
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Encodes the response into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decodes a response body.
    pub fn from_bytes(body: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(body)
    }
}
