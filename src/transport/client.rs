//! Peer Client
//!
//! Fetches keys from a remote peer over HTTP.

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::error::PeerError;
use crate::models::wire;
use crate::peers::PeerGetter;

// == HTTP Getter ==
/// Client handle for one peer, rooted at `<peer address><base path>`.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGetter {
    /// `client` carries the request timeout; clones share one connection pool.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base url><escaped group>/<escaped key>`.
    pub fn request_url(&self, request: &wire::Request) -> Result<Url, PeerError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| PeerError::CannotBeABase(self.base_url.clone()))?
            .pop_if_empty()
            .push(&request.group)
            .push(&request.key);
        Ok(url)
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, request: &wire::Request) -> Result<wire::Response, PeerError> {
        let url = self.request_url(request)?;
        debug!(%url, "fetching from peer");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PeerError::Status { status, body });
        }

        let body = response.bytes().await?;
        Ok(wire::Response::from_bytes(&body)?)
    }
}
