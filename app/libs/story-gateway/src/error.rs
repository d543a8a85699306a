//! Error types for the story API client.

use error_types::{Classify, ErrorClass};
use thiserror::Error;

/// Result type alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by the remote gateway. Every call is single-attempt, so
/// these describe exactly one request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credential is available, or the server rejected it.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Login was refused.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The request never produced an HTTP response (offline, DNS, timeout).
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The server answered with a non-success status.
    #[error("Request rejected ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Server-side failures (5xx) are worth retrying later; client-side
    /// rejections are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::NetworkUnavailable(_) => true,
            GatewayError::RemoteRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl Classify for GatewayError {
    fn class(&self) -> ErrorClass {
        match self {
            GatewayError::AuthRequired(_) | GatewayError::InvalidCredentials(_) => {
                ErrorClass::AuthRequired
            }
            GatewayError::NetworkUnavailable(_) => ErrorClass::NetworkUnavailable,
            GatewayError::RemoteRejected { .. } | GatewayError::Decode(_) => {
                ErrorClass::RemoteRejected
            }
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::NetworkUnavailable(err.to_string())
        }
    }
}
