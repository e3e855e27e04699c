//! Loader Module
//!
//! The data source a group falls back to on a cache miss.

use async_trait::async_trait;

// == Loader ==
/// Loads the authoritative bytes for a key.
///
/// Errors are handed back verbatim to every caller waiting on the key.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

// == Loader Fn ==
/// Adapts a synchronous closure into a `Loader`.
///
/// # Example
/// ```
/// use peercache::group::LoaderFn;
///
/// let loader = LoaderFn::new(|key: &str| Ok(key.as_bytes().to_vec()));
/// ```
pub struct LoaderFn<F>(F);

impl<F> LoaderFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self(func)
    }
}

#[async_trait]
impl<F> Loader for LoaderFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}
