//! Per-request routing.
//!
//! Every intercepted request moves through the same states: received,
//! classified, then either a store lookup or a network attempt, then
//! resolved. Classification is derived purely from the URL; the matching
//! strategy (see [`strategies`]) decides what the caller finally sees.

pub mod strategies;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use bytes::Bytes;
use shellward_client::{FetchResponse, Network, Url, fetch::url as urls};
use shellward_core::{AppConfig, Error, StoredResponse, VersionedStore};

/// Image suffixes handled by the cache-first image strategy.
static IMAGE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif)$").unwrap());

/// What kind of resource a request is resolving, as reported by the caller.
///
/// Orthogonal to [`RequestClass`]: classification picks the strategy,
/// destination only steers the offline fallback for failed fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A full page navigation.
    Document,
    Image,
    Other,
}

/// One intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub destination: Destination,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self { url, destination: Destination::Other }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}

/// Request classification, first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Matches an excluded host pattern; not intercepted at all.
    Excluded,
    /// URL extension is one of the image suffixes.
    ImageLike,
    Generic,
}

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// Excluded host, network response relayed unmodified.
    Passthrough,
    /// Synthesized inline SVG for a failed image fetch.
    PlaceholderImage,
    /// Cached root document served for a failed navigation.
    OfflineShell,
    /// Synthesized 408 text for anything else that failed offline.
    OfflineNotice,
}

/// The response handed back to the caller.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl RouteResponse {
    pub(crate) fn from_entry(entry: StoredResponse, source: ResponseSource) -> Self {
        Self {
            status: entry.status,
            content_type: entry.content_type,
            body: entry.body,
            source,
        }
    }

    pub(crate) fn from_network(resp: &FetchResponse, source: ResponseSource) -> Self {
        Self {
            status: resp.status.as_u16(),
            content_type: resp.content_type.clone(),
            body: resp.bytes.clone(),
            source,
        }
    }
}

/// Capture a network response as a store entry.
///
/// Clones the body handle rather than the buffer, so the copy written to
/// the store is independent of the copy already on its way to the caller.
pub(crate) fn capture(resp: &FetchResponse) -> StoredResponse {
    let mut entry = StoredResponse::new(
        resp.url.as_str(),
        resp.status.as_u16(),
        resp.content_type.clone(),
        resp.bytes.clone(),
    );
    entry.headers_json = headers_to_json(resp);
    entry
}

fn headers_to_json(resp: &FetchResponse) -> Option<String> {
    let map: serde_json::Map<String, serde_json::Value> = resp
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), serde_json::Value::from(v)))
        })
        .collect();
    if map.is_empty() {
        return None;
    }
    serde_json::to_string(&map).ok()
}

/// Routes intercepted requests to the store, the network, or a fallback.
#[derive(Clone)]
pub struct Router {
    pub(crate) store: VersionedStore,
    pub(crate) net: Arc<dyn Network>,
    pub(crate) origin: Url,
    excluded_hosts: Vec<String>,
    /// Canonical key of the offline shell document.
    pub(crate) shell_key: Url,
}

impl Router {
    pub fn new(store: VersionedStore, net: Arc<dyn Network>, config: &AppConfig) -> Result<Self, Error> {
        let origin = urls::canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let shell_key =
            urls::resolve(&origin, &config.offline_document).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            store,
            net,
            origin,
            excluded_hosts: config.excluded_hosts.clone(),
            shell_key,
        })
    }

    /// Classify a request URL; checks run in order, first match wins.
    pub fn classify(&self, url: &Url) -> RequestClass {
        if self.excluded_hosts.iter().any(|host| url.as_str().contains(host.as_str())) {
            return RequestClass::Excluded;
        }
        if IMAGE_SUFFIX.is_match(url.path()) {
            return RequestClass::ImageLike;
        }
        RequestClass::Generic
    }

    /// Resolve one request to a response.
    ///
    /// Excluded hosts bypass the store entirely and their transport errors
    /// propagate raw; everything else recovers locally per strategy and
    /// never surfaces a network failure to the caller.
    pub async fn route(&self, req: &FetchRequest) -> Result<RouteResponse, Error> {
        match self.classify(&req.url) {
            RequestClass::Excluded => {
                tracing::debug!(url = %req.url, "excluded host, passing through");
                let resp = self.net.fetch(&req.url).await?;
                Ok(RouteResponse::from_network(&resp, ResponseSource::Passthrough))
            }
            RequestClass::ImageLike => self.cache_first_image(req).await,
            RequestClass::Generic => self.offline_fallback(req).await,
        }
    }
}
