//! # Offline Sync
//!
//! Keeps the app usable without a connection:
//!
//! - [`SyncCoordinator`] delivers new stories or queues them durably, and
//!   drains the queue in order when connectivity returns;
//! - [`FeedLoader`] mirrors the remote feed locally and falls back to the
//!   mirror when the server is unreachable;
//! - [`ConnectivityMonitor`] carries the online signal;
//! - [`Notifier`] shows push and sync notifications.

mod connectivity;
mod coordinator;
mod error;
mod feed;
mod notify;

pub use connectivity::ConnectivityMonitor;
pub use coordinator::{DrainReport, Submission, SyncCoordinator, SyncMode};
pub use error::{SyncError, SyncResult};
pub use feed::{FallbackCause, FeedLoader, FeedState};
pub use notify::{
    Notification, NotificationAction, Notifier, RecordingNotifier, TracingNotifier,
    SYNC_SUCCESS_TAG,
};
