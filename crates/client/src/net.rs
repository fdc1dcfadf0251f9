//! The network seam.
//!
//! Lifecycle and routing code talk to the network through this trait so
//! tests can exercise cache misses, failing fetches, and offline behavior
//! without a live server.

use async_trait::async_trait;
use reqwest::Url;

use crate::fetch::{FetchClient, FetchResponse};
use shellward_core::Error;

/// Something that can resolve a URL into a response.
///
/// Transport failures are `Err(Error::Network)`; any HTTP status, including
/// errors, comes back as `Ok` so callers can pass non-200 responses through
/// unmodified.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error>;
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        FetchClient::fetch(self, url).await
    }
}
