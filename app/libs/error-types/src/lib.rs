//! Shared error taxonomy for the offline story engine.
//!
//! Every library keeps its own `thiserror` enum; this crate only defines the
//! four (plus validation) classes those errors collapse into at component
//! boundaries, so the coordinator, the feed policy and the interception layer
//! can decide between "surface it", "fall back" and "enqueue" without knowing
//! which library produced the failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Boundary-level classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Missing or rejected credential. Surfaced, never retried.
    AuthRequired,
    /// Transient connectivity failure. Triggers fallback or enqueue.
    NetworkUnavailable,
    /// Local persistence is degraded. Offline features are disabled.
    StorageUnavailable,
    /// Server answered with a non-success status and a message.
    RemoteRejected,
    /// Input rejected before any I/O happened.
    Validation,
}

impl ErrorClass {
    /// Whether the failure is worth retrying on a later connectivity event.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorClass::NetworkUnavailable)
    }

    /// Whether the failure is actionable by the user and should be shown.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            ErrorClass::AuthRequired | ErrorClass::RemoteRejected | ErrorClass::Validation
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::AuthRequired => "auth_required",
            ErrorClass::NetworkUnavailable => "network_unavailable",
            ErrorClass::StorageUnavailable => "storage_unavailable",
            ErrorClass::RemoteRejected => "remote_rejected",
            ErrorClass::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every library error so boundaries can classify it.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

/// Machine-readable error body used for synthesized and API error responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Stable marker, e.g. `"offline"` or an [`ErrorClass`] name.
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Marker returned in place of structured data while offline.
    pub fn offline() -> Self {
        Self::new(
            error_codes::OFFLINE,
            "API is unavailable while offline. Data will sync once the connection is back.",
        )
    }

    pub fn from_class(class: ErrorClass, message: impl Into<String>) -> Self {
        Self::new(class.as_str(), message)
    }

    pub fn to_json(&self) -> String {
        // Serializing a struct of strings and a timestamp cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"error\":\"offline\"}"))
    }
}

pub mod error_codes {
    pub const OFFLINE: &str = "offline";
}
