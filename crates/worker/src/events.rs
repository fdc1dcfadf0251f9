//! Worker event dispatch.
//!
//! The host delivers a closed set of lifecycle and runtime events; each
//! routes to exactly one handler. Install and activate run all their async
//! work to completion before the dispatch resolves, matching the host's
//! extend-my-lifetime hook.

use std::sync::Arc;

use shellward_client::Network;
use shellward_core::{AppConfig, CacheDb, Error, VersionedStore};

use crate::lifecycle::{ActivationReport, Activator, InstallReport, Installer};
use crate::notify::{self, Notification, Notifier, PushPayload};
use crate::router::{FetchRequest, RouteResponse, Router};

/// Everything the host can deliver to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// Message from a client page, JSON payload.
    Message(serde_json::Value),
    /// Push message; `None` when the push carried no data.
    Push(Option<String>),
    NotificationClick {
        action: Option<String>,
    },
    Sync {
        tag: String,
    },
}

/// Result of a dispatched event.
#[derive(Debug)]
pub enum Dispatched {
    Installed(InstallReport),
    Activated(ActivationReport),
    Response(RouteResponse),
    /// Event consumed with no result to return.
    Acknowledged,
}

/// The worker: one dispatcher over config, store, network, and notifier.
pub struct Worker {
    config: AppConfig,
    db: CacheDb,
    net: Arc<dyn Network>,
    router: Router,
    notifier: Notifier,
}

impl Worker {
    /// Build a worker for the configured cache version.
    pub async fn new(config: AppConfig, db: CacheDb, net: Arc<dyn Network>) -> Result<Self, Error> {
        let store = VersionedStore::open(db.clone(), config.cache_version.clone()).await?;
        let router = Router::new(store, Arc::clone(&net), &config)?;
        Ok(Self {
            config,
            db,
            net,
            router,
            notifier: Notifier,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Route one event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<Dispatched, Error> {
        match event {
            WorkerEvent::Install => Installer::new(&self.db, self.net.as_ref(), &self.config)
                .run()
                .await
                .map(Dispatched::Installed),
            WorkerEvent::Activate => Activator::new(&self.db, &self.config.cache_version)
                .run()
                .await
                .map(Dispatched::Activated),
            WorkerEvent::Fetch(req) => self.router.route(&req).await.map(Dispatched::Response),
            WorkerEvent::Message(payload) => {
                if payload.get("type").and_then(|t| t.as_str()) == Some("SKIP_WAITING") {
                    tracing::info!("client requested immediate takeover");
                } else {
                    tracing::debug!(%payload, "ignoring client message");
                }
                Ok(Dispatched::Acknowledged)
            }
            WorkerEvent::Push(data) => {
                if let Some(payload) = PushPayload::parse(data.as_deref()) {
                    self.notifier.show(&Notification::from_push(payload));
                }
                Ok(Dispatched::Acknowledged)
            }
            WorkerEvent::NotificationClick { action } => {
                tracing::info!(action = action.as_deref().unwrap_or("default"), "notification clicked");
                Ok(Dispatched::Acknowledged)
            }
            WorkerEvent::Sync { tag } => {
                if tag == "background-sync" {
                    notify::background_sync(&tag);
                } else {
                    tracing::debug!(tag = %tag, "ignoring unknown sync tag");
                }
                Ok(Dispatched::Acknowledged)
            }
        }
    }
}
