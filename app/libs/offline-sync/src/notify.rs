//! User-facing notifications: push payloads and sync confirmations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::info;

pub const DEFAULT_TITLE: &str = "Story App";
pub const DEFAULT_BODY: &str = "New update available!";
pub const DEFAULT_TAG: &str = "story-app-notification";
pub const SYNC_SUCCESS_TAG: &str = "sync-success";
const DEFAULT_ICON: &str = "./icon/icons/icon-96x96.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    /// Page opened when the notification is clicked.
    pub url: String,
    pub actions: Vec<NotificationAction>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            tag: DEFAULT_TAG.to_string(),
            url: "/".to_string(),
            actions: vec![
                NotificationAction {
                    action: "open".to_string(),
                    title: "Open app".to_string(),
                },
                NotificationAction {
                    action: "close".to_string(),
                    title: "Close".to_string(),
                },
            ],
        }
    }
}

impl Notification {
    /// Build a notification from a push payload.
    ///
    /// A JSON object overrides the defaults field by field (`data.url` sets
    /// the click target). Anything else becomes the body text.
    pub fn from_push(payload: &[u8]) -> Self {
        let mut notification = Self::default();
        if payload.is_empty() {
            return notification;
        }

        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(fields)) => {
                let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
                if let Some(title) = text("title") {
                    notification.title = title;
                }
                if let Some(body) = text("body") {
                    notification.body = body;
                }
                if let Some(icon) = text("icon") {
                    notification.icon = icon;
                }
                if let Some(badge) = text("badge") {
                    notification.badge = badge;
                }
                if let Some(tag) = text("tag") {
                    notification.tag = tag;
                }
                if let Some(url) = fields
                    .get("data")
                    .and_then(|data| data.get("url"))
                    .and_then(Value::as_str)
                {
                    notification.url = url.to_string();
                }
            }
            _ => notification.body = String::from_utf8_lossy(payload).into_owned(),
        }
        notification
    }

    /// Confirmation that a queued story reached the server.
    pub fn sync_success(description: &str) -> Self {
        Self {
            title: "Story synced".to_string(),
            body: format!("Story \"{description}\" has been sent to the server"),
            tag: SYNC_SUCCESS_TAG.to_string(),
            ..Self::default()
        }
    }
}

/// Capability to show a notification. Fire-and-forget: implementations must
/// not block and never report failure.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs notifications instead of displaying them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            "Notification"
        );
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.seen.lock() {
            Ok(mut seen) => seen.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
