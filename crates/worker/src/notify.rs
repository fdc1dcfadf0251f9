//! Notification, push, and sync plumbing.
//!
//! Fire-and-forget by design: nothing in here affects routing or the
//! store. Display is delegated to the host; this module only parses
//! payloads, fills in defaults, and logs.

use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Shellward";
const DEFAULT_BODY: &str = "New notification";
const ICON: &str = "./icon.png";

/// Payload carried by a push message, all fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl PushPayload {
    /// Parse a push message body.
    ///
    /// Returns None for an empty push or an unparseable payload; a push
    /// with no data shows nothing.
    pub fn parse(data: Option<&str>) -> Option<Self> {
        let data = data?;
        match serde_json::from_str(data) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("ignoring malformed push payload: {e}");
                None
            }
        }
    }
}

/// A button attached to a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// A notification ready for the host display API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Build the standard notification for a push payload.
    pub fn from_push(payload: PushPayload) -> Self {
        Self {
            title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: payload.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: ICON.to_string(),
            badge: ICON.to_string(),
            vibrate: vec![100, 50, 100],
            actions: vec![
                NotificationAction {
                    action: "explore".to_string(),
                    title: "Explore".to_string(),
                    icon: ICON.to_string(),
                },
                NotificationAction {
                    action: "close".to_string(),
                    title: "Close".to_string(),
                    icon: ICON.to_string(),
                },
            ],
        }
    }
}

/// Hands notifications off to the host.
#[derive(Debug, Clone, Default)]
pub struct Notifier;

impl Notifier {
    /// Fire-and-forget display.
    pub fn show(&self, notification: &Notification) {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            "showing notification"
        );
    }
}

/// Background sync hook. Placeholder: logs and returns.
pub fn background_sync(tag: &str) {
    tracing::info!(tag, "background sync");
}
