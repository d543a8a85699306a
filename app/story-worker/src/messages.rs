//! Page-to-worker messages.

use offline_sync::DrainReport;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::context::WorkerContext;

pub const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
pub enum WorkerMessage {
    /// Take over immediately: activate the current cache generation.
    SkipWaiting,
    /// A story was queued; drain on the next online signal.
    RegisterSync,
    /// Drain now and report back.
    SyncNow {
        reply: Option<oneshot::Sender<DrainReport>>,
    },
}

pub fn channel() -> (mpsc::Sender<WorkerMessage>, mpsc::Receiver<WorkerMessage>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Handle messages until every sender is dropped.
pub async fn run(worker: &WorkerContext, mut rx: mpsc::Receiver<WorkerMessage>) {
    while let Some(message) = rx.recv().await {
        debug!(?message, "Worker message received");
        match message {
            WorkerMessage::SkipWaiting => match worker.interceptor.activate().await {
                Ok(deleted) => info!(deleted = deleted.len(), "Skipped waiting"),
                Err(e) => warn!(error = %e, "Activation failed"),
            },
            WorkerMessage::RegisterSync => worker.coordinator.schedule_background_drain(),
            WorkerMessage::SyncNow { reply } => {
                let report = worker.coordinator.drain().await;
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
        }
    }
    debug!("Worker message channel closed");
}
