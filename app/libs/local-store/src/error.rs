//! Error types for the local store.

use error_types::{Classify, ErrorClass};
use thiserror::Error;

/// Result type alias for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the local store.
///
/// Every variant classifies as [`ErrorClass::StorageUnavailable`]: callers
/// degrade offline features and keep online ones running.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened, read or written.
    #[error("Local storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// The file was written by a newer schema than this build understands.
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i64, supported: i64 },

    /// A stored row could not be decoded.
    #[error("Corrupt row in {collection}: {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },
}

impl Classify for StoreError {
    fn class(&self) -> ErrorClass {
        ErrorClass::StorageUnavailable
    }
}
