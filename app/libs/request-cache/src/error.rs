//! Error types for the interception layer.

use error_types::{Classify, ErrorClass};
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;
pub type FetchResult<T> = Result<T, FetchError>;

/// Failures of the cache storage backend.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Corrupt cache entry for {url}: {reason}")]
    Corrupt { url: String, reason: String },
}

impl Classify for CacheError {
    fn class(&self) -> ErrorClass {
        ErrorClass::StorageUnavailable
    }
}

/// Failures to obtain any response from the network.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No HTTP response was produced (offline, DNS, refused, timeout).
    #[error("Network request failed: {0}")]
    Network(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Classify for FetchError {
    fn class(&self) -> ErrorClass {
        match self {
            FetchError::Network(_) => ErrorClass::NetworkUnavailable,
            FetchError::InvalidRequest(_) => ErrorClass::Validation,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
