//! Caching strategies.
//!
//! Both strategies consult the store before the network. Images degrade to
//! an inline placeholder when the network is gone; everything else degrades
//! to the cached offline shell (document navigations) or a terse 408
//! notice. Write-throughs run on a spawned task and never delay or fail
//! the response already headed back to the caller.

use shellward_client::{FetchResponse, StatusCode};
use shellward_core::Error;

use super::{Destination, FetchRequest, ResponseSource, RouteResponse, Router, capture};

/// Body of the synthesized offline notice.
pub const OFFLINE_NOTICE_BODY: &str = "You are offline, and this resource is not cached.";

/// Placeholder served when an image fetch fails with nothing cached.
const PLACEHOLDER_SVG: &str = r##"<svg width="200" height="200" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="#1a2a3a"/><text x="50%" y="50%" font-family="Arial" font-size="14" fill="#fff" text-anchor="middle" dy=".3em">Image Not Available</text></svg>"##;

pub(crate) fn placeholder_image() -> RouteResponse {
    RouteResponse {
        status: 200,
        content_type: Some("image/svg+xml".to_string()),
        body: PLACEHOLDER_SVG.into(),
        source: ResponseSource::PlaceholderImage,
    }
}

pub(crate) fn offline_notice() -> RouteResponse {
    RouteResponse {
        status: 408,
        content_type: Some("text/plain".to_string()),
        body: OFFLINE_NOTICE_BODY.into(),
        source: ResponseSource::OfflineNotice,
    }
}

impl Router {
    /// Cache-first strategy for image-like requests.
    pub(crate) async fn cache_first_image(&self, req: &FetchRequest) -> Result<RouteResponse, Error> {
        if let Some(entry) = self.store.get(req.url.as_str()).await? {
            return Ok(RouteResponse::from_entry(entry, ResponseSource::Cache));
        }

        match self.net.fetch(&req.url).await {
            Ok(resp) => {
                // non-200 passes through unmodified and is never stored
                if resp.status == StatusCode::OK {
                    self.write_through(&resp);
                }
                Ok(RouteResponse::from_network(&resp, ResponseSource::Network))
            }
            Err(e) => {
                tracing::debug!(url = %req.url, "image fetch failed, serving placeholder: {e}");
                Ok(placeholder_image())
            }
        }
    }

    /// Offline-fallback strategy for generic requests.
    ///
    /// Precedence is cache, then network, then a local fallback. Only
    /// "basic" responses (un-redirected same-origin 200s) are written
    /// through; anything else is served without being stored.
    pub(crate) async fn offline_fallback(&self, req: &FetchRequest) -> Result<RouteResponse, Error> {
        if let Some(entry) = self.store.get(req.url.as_str()).await? {
            return Ok(RouteResponse::from_entry(entry, ResponseSource::Cache));
        }

        match self.net.fetch(&req.url).await {
            Ok(resp) => {
                if resp.is_basic(&self.origin) {
                    self.write_through(&resp);
                }
                Ok(RouteResponse::from_network(&resp, ResponseSource::Network))
            }
            Err(e) => {
                tracing::debug!(url = %req.url, destination = ?req.destination, "fetch failed, going offline: {e}");
                if req.destination == Destination::Document
                    && let Some(shell) = self.store.get(self.shell_key.as_str()).await?
                {
                    return Ok(RouteResponse::from_entry(shell, ResponseSource::OfflineShell));
                }
                Ok(offline_notice())
            }
        }
    }

    /// Queue a best-effort store write without delaying the response.
    fn write_through(&self, resp: &FetchResponse) {
        let entry = capture(resp);
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.put(&entry).await {
                tracing::warn!(key = %entry.request_key, "store write failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::router::FetchRequest;
    use crate::testutil::StubNetwork;
    use shellward_client::Url;
    use shellward_core::{AppConfig, CacheDb, StoredResponse, VersionedStore};

    const ORIGIN: &str = "https://example.com";

    async fn make_router(net: Arc<StubNetwork>) -> Router {
        let db = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig { origin: ORIGIN.into(), ..Default::default() };
        let store = VersionedStore::open(db, &config.cache_version).await.unwrap();
        Router::new(store, net, &config).unwrap()
    }

    fn request(url: &str) -> FetchRequest {
        FetchRequest::new(Url::parse(url).unwrap())
    }

    async fn seed(router: &Router, key: &str, content_type: &str, body: &str) {
        router
            .store
            .put(&StoredResponse::new(
                key,
                200,
                Some(content_type.to_string()),
                body.as_bytes().to_vec().into(),
            ))
            .await
            .unwrap();
    }

    /// Wait for the spawned write-through to land, if it is going to.
    async fn wait_for_entry(router: &Router, key: &str) -> Option<StoredResponse> {
        for _ in 0..100 {
            if let Some(entry) = router.store.get(key).await.unwrap() {
                return Some(entry);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_cached_image_never_fetches() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(Arc::clone(&net)).await;
        seed(&router, "https://example.com/p1.jpg", "image/jpeg", "jpegbytes").await;

        let resp = router.route(&request("https://example.com/p1.jpg")).await.unwrap();

        assert_eq!(resp.source, ResponseSource::Cache);
        assert_eq!(resp.body, bytes::Bytes::from_static(b"jpegbytes"));
        assert!(net.calls().is_empty(), "cache hit must not touch the network");
    }

    #[tokio::test]
    async fn test_image_miss_fetches_and_writes_through() {
        let net = Arc::new(StubNetwork::new());
        net.respond("https://example.com/new.png", 200, "image/png", "pngbytes");
        let router = make_router(Arc::clone(&net)).await;

        let resp = router.route(&request("https://example.com/new.png")).await.unwrap();
        assert_eq!(resp.source, ResponseSource::Network);
        assert_eq!(resp.status, 200);

        let entry = wait_for_entry(&router, "https://example.com/new.png").await.unwrap();
        assert_eq!(entry.body, bytes::Bytes::from_static(b"pngbytes"));
    }

    #[tokio::test]
    async fn test_image_non_200_passes_through_uncached() {
        let net = Arc::new(StubNetwork::new());
        net.respond("https://example.com/gone.gif", 404, "text/plain", "not found");
        let router = make_router(Arc::clone(&net)).await;

        let resp = router.route(&request("https://example.com/gone.gif")).await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.source, ResponseSource::Network);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(router.store.get("https://example.com/gone.gif").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_image_failure_yields_placeholder() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(net).await;

        let resp = router.route(&request("https://example.com/missing.png")).await.unwrap();

        assert_eq!(resp.source, ResponseSource::PlaceholderImage);
        assert_eq!(resp.content_type.as_deref(), Some("image/svg+xml"));
        assert!((200..300).contains(&resp.status));
        let body = std::str::from_utf8(&resp.body).unwrap();
        assert!(body.contains("Image Not Available"));
    }

    #[tokio::test]
    async fn test_generic_hit_serves_cache() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(Arc::clone(&net)).await;
        seed(&router, "https://example.com/app.js", "text/javascript", "console.log(1)").await;

        let resp = router.route(&request("https://example.com/app.js")).await.unwrap();
        assert_eq!(resp.source, ResponseSource::Cache);
        assert!(net.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generic_basic_response_written_through() {
        let net = Arc::new(StubNetwork::new());
        net.respond("https://example.com/styles.css", 200, "text/css", "body{}");
        let router = make_router(net).await;

        let resp = router.route(&request("https://example.com/styles.css")).await.unwrap();
        assert_eq!(resp.source, ResponseSource::Network);

        let entry = wait_for_entry(&router, "https://example.com/styles.css").await.unwrap();
        assert_eq!(entry.content_type.as_deref(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_generic_cross_origin_not_cached() {
        let net = Arc::new(StubNetwork::new());
        net.respond("https://cdn.other.com/lib.js", 200, "text/javascript", "x");
        let router = make_router(net).await;

        let resp = router.route(&request("https://cdn.other.com/lib.js")).await.unwrap();
        assert_eq!(resp.status, 200);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(router.store.get("https://cdn.other.com/lib.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_document_offline_falls_back_to_shell() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(net).await;
        seed(&router, "https://example.com/index.html", "text/html", "<html>shell</html>").await;

        let req = request("https://example.com/profile").with_destination(Destination::Document);
        let resp = router.route(&req).await.unwrap();

        assert_eq!(resp.source, ResponseSource::OfflineShell);
        assert_eq!(resp.body, bytes::Bytes::from_static(b"<html>shell</html>"));
    }

    #[tokio::test]
    async fn test_document_offline_without_shell_gets_notice() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(net).await;

        let req = request("https://example.com/profile").with_destination(Destination::Document);
        let resp = router.route(&req).await.unwrap();
        assert_eq!(resp.source, ResponseSource::OfflineNotice);
        assert_eq!(resp.status, 408);
    }

    #[tokio::test]
    async fn test_generic_offline_notice_exact_body() {
        let net = Arc::new(StubNetwork::new());
        let router = make_router(net).await;

        let resp = router.route(&request("https://example.com/styles.css")).await.unwrap();

        assert_eq!(resp.status, 408);
        assert_eq!(resp.content_type.as_deref(), Some("text/plain"));
        assert_eq!(
            std::str::from_utf8(&resp.body).unwrap(),
            "You are offline, and this resource is not cached."
        );
    }

    #[tokio::test]
    async fn test_write_through_does_not_block_response() {
        let net = Arc::new(StubNetwork::new());
        net.respond("https://example.com/late.css", 200, "text/css", "body{}");
        let router = make_router(net).await;

        // the response resolves regardless of whether the spawned write has
        // landed; the entry appears at some point after
        let resp = router.route(&request("https://example.com/late.css")).await.unwrap();
        assert_eq!(resp.source, ResponseSource::Network);
        assert!(wait_for_entry(&router, "https://example.com/late.css").await.is_some());
    }
}
