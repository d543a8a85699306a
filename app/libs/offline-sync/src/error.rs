use error_types::{Classify, ErrorClass};
use local_store::StoreError;
use story_gateway::GatewayError;
use story_model::ModelError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures surfaced by [`SyncCoordinator::submit`](crate::SyncCoordinator::submit).
/// Transient delivery failures never show up here; they end in the queue.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ModelError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The story could not be delivered nor queued.
    #[error("Could not queue story: {0}")]
    Store(#[from] StoreError),
}

impl Classify for SyncError {
    fn class(&self) -> ErrorClass {
        match self {
            SyncError::Validation(e) => e.class(),
            SyncError::Gateway(e) => e.class(),
            SyncError::Store(e) => e.class(),
        }
    }
}
