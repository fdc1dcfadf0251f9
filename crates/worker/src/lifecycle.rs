//! Install and activate lifecycle.
//!
//! Install populates a fresh store with the app-shell manifest; activate
//! garbage-collects every store whose version does not match the current
//! one. Both run all their sub-operations to completion before reporting
//! done.

use shellward_client::{Network, StatusCode, fetch::url as urls};
use shellward_core::{AppConfig, CacheDb, Error, VersionedStore};

use crate::router::capture;

/// Outcome of a completed install.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub version: String,
    /// Number of manifest entries written.
    pub entries: usize,
}

/// Populates the store for the target version from the asset manifest.
///
/// All-or-nothing: every manifest asset is fetched from the network first,
/// and nothing is written unless every fetch came back 200. A failed
/// install leaves the previous version's store untouched and serving.
pub struct Installer<'a> {
    db: &'a CacheDb,
    net: &'a dyn Network,
    config: &'a AppConfig,
}

impl<'a> Installer<'a> {
    pub fn new(db: &'a CacheDb, net: &'a dyn Network, config: &'a AppConfig) -> Self {
        Self { db, net, config }
    }

    pub async fn run(&self) -> Result<InstallReport, Error> {
        let version = &self.config.cache_version;
        tracing::info!(version = %version, assets = self.config.manifest.len(), "installing app shell");

        let origin = urls::canonicalize(&self.config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut fetched = Vec::with_capacity(self.config.manifest.len());
        for path in &self.config.manifest {
            let url = urls::resolve(&origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let resp = self
                .net
                .fetch(&url)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if resp.status != StatusCode::OK {
                return Err(Error::InstallFailed(format!(
                    "{path}: status {}",
                    resp.status.as_u16()
                )));
            }
            fetched.push(resp);
        }

        let store = VersionedStore::open(self.db.clone(), version.clone()).await?;
        for resp in &fetched {
            store.put(&capture(resp)).await?;
        }

        // no waiting period: the caller may activate this version right away
        tracing::info!(version = %version, entries = fetched.len(), "install complete");
        Ok(InstallReport { version: version.clone(), entries: fetched.len() })
    }
}

/// Outcome of a completed activation.
#[derive(Debug, Clone)]
pub struct ActivationReport {
    pub retained: String,
    pub deleted: Vec<String>,
}

/// Rotates the store to the current version.
///
/// Deletes every store whose tag differs from the current version and only
/// reports done once all deletions have resolved; at most one store
/// remains afterwards.
pub struct Activator<'a> {
    db: &'a CacheDb,
    version: &'a str,
}

impl<'a> Activator<'a> {
    pub fn new(db: &'a CacheDb, version: &'a str) -> Self {
        Self { db, version }
    }

    pub async fn run(&self) -> Result<ActivationReport, Error> {
        tracing::info!(version = self.version, "activating");

        VersionedStore::open(self.db.clone(), self.version).await?;

        let mut deleted = Vec::new();
        for stale in self.db.list_versions().await? {
            if stale != self.version {
                tracing::info!(version = %stale, "deleting old store");
                self.db.delete_store(&stale).await?;
                deleted.push(stale);
            }
        }

        // from here every in-flight client is governed by this version
        tracing::info!(version = self.version, deleted = deleted.len(), "activation complete, claiming clients");
        Ok(ActivationReport { retained: self.version.to_string(), deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubNetwork;

    const ORIGIN: &str = "https://example.com";

    fn test_config() -> AppConfig {
        AppConfig {
            origin: ORIGIN.into(),
            cache_version: "shell-v2".into(),
            manifest: vec!["./".into(), "./index.html".into(), "./icon.png".into()],
            ..Default::default()
        }
    }

    fn seed_manifest(net: &StubNetwork) {
        net.respond("https://example.com/", 200, "text/html", "<html>root</html>");
        net.respond("https://example.com/index.html", 200, "text/html", "<html>shell</html>");
        net.respond("https://example.com/icon.png", 200, "image/png", "png");
    }

    #[tokio::test]
    async fn test_install_populates_manifest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::new();
        seed_manifest(&net);
        let config = test_config();

        let report = Installer::new(&db, &net, &config).run().await.unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(db.entry_count("shell-v2").await.unwrap(), 3);

        let store = VersionedStore::open(db, "shell-v2").await.unwrap();
        let shell = store.get("https://example.com/index.html").await.unwrap().unwrap();
        assert_eq!(shell.body, bytes::Bytes::from_static(b"<html>shell</html>"));
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::new();
        seed_manifest(&net);
        let config = test_config();

        Installer::new(&db, &net, &config).run().await.unwrap();
        Installer::new(&db, &net, &config).run().await.unwrap();

        // one entry per manifest path, no duplicates, no growth
        assert_eq!(db.entry_count("shell-v2").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_aborts_on_failed_fetch() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::new();
        net.respond("https://example.com/", 200, "text/html", "<html>root</html>");
        net.respond("https://example.com/index.html", 200, "text/html", "<html>shell</html>");
        // ./icon.png unregistered: the fetch fails
        let config = test_config();

        let result = Installer::new(&db, &net, &config).run().await;

        assert!(matches!(result, Err(Error::InstallFailed(_))));
        // nothing was written for the partially fetched manifest
        assert_eq!(db.entry_count("shell-v2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_aborts_on_non_200() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::new();
        seed_manifest(&net);
        net.respond("https://example.com/icon.png", 500, "text/plain", "boom");
        let config = test_config();

        let result = Installer::new(&db, &net, &config).run().await;
        assert!(matches!(result, Err(Error::InstallFailed(_))));
    }

    #[tokio::test]
    async fn test_failed_install_leaves_previous_version() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = VersionedStore::open(db.clone(), "shell-v1").await.unwrap();
        v1.put(&shellward_core::StoredResponse::new(
            "https://example.com/index.html",
            200,
            Some("text/html".into()),
            bytes::Bytes::from_static(b"old shell"),
        ))
        .await
        .unwrap();

        let net = StubNetwork::new();
        let config = test_config();
        let result = Installer::new(&db, &net, &config).run().await;
        assert!(result.is_err());

        assert_eq!(db.entry_count("shell-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activate_retains_only_current() {
        let db = CacheDb::open_in_memory().await.unwrap();
        VersionedStore::open(db.clone(), "shell-v1").await.unwrap();
        VersionedStore::open(db.clone(), "shell-v2").await.unwrap();

        let report = Activator::new(&db, "shell-v2").run().await.unwrap();

        assert_eq!(report.retained, "shell-v2");
        assert_eq!(report.deleted, vec!["shell-v1".to_string()]);
        assert_eq!(db.list_versions().await.unwrap(), vec!["shell-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_makes_old_entries_unreachable() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = VersionedStore::open(db.clone(), "shell-v1").await.unwrap();
        v1.put(&shellward_core::StoredResponse::new(
            "https://example.com/index.html",
            200,
            Some("text/html".into()),
            bytes::Bytes::from_static(b"old"),
        ))
        .await
        .unwrap();

        Activator::new(&db, "shell-v2").run().await.unwrap();

        let v1_again = VersionedStore::open(db.clone(), "shell-v1").await.unwrap();
        assert!(v1_again.get("https://example.com/index.html").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activate_with_no_old_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let report = Activator::new(&db, "shell-v1").run().await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(db.list_versions().await.unwrap(), vec!["shell-v1".to_string()]);
    }
}
