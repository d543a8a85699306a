//! Submission and queue draining.
//!
//! A story is either delivered right away or written to the durable queue.
//! The queue is drained when connectivity returns: entries are sent one at a
//! time in `seq` order and each is removed only after the server accepted
//! it, so a drain interrupted at any point resumes on the next online
//! transition without losing or reordering anything.
//!
//! # Delivery guarantees
//!
//! - **At-least-once**: an entry delivered but not yet removed (crash, store
//!   failure) is sent again by the next drain.
//! - **Order**: entries are attempted in ascending `seq`.
//! - **No retry loop**: a failed entry stays queued until the next drain.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use local_store::LocalStore;
use story_gateway::{Accepted, StoryApi};
use story_model::NewStory;

use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notification, Notifier};

const REPORT_CHANNEL_CAPACITY: usize = 16;

/// How queued stories get drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Enqueueing also arms a one-shot task that drains on the next online
    /// signal.
    Background,
    /// Only the online-transition listener drains.
    Foreground,
}

#[derive(Debug)]
pub enum Submission {
    Delivered(Accepted),
    /// Stored locally; will be sent when connectivity returns.
    Queued { seq: i64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Queue length after the drain.
    pub remaining: usize,
    /// Another drain was already running; nothing was attempted.
    pub skipped: bool,
}

impl DrainReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

struct Inner {
    store: LocalStore,
    api: Arc<dyn StoryApi>,
    connectivity: ConnectivityMonitor,
    notifier: Arc<dyn Notifier>,
    mode: SyncMode,
    drain_lock: Mutex<()>,
    armed: AtomicBool,
    reports: broadcast::Sender<DrainReport>,
}

/// Submits stories and drains the pending queue. Cheap to clone.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(
        store: LocalStore,
        api: Arc<dyn StoryApi>,
        connectivity: ConnectivityMonitor,
        notifier: Arc<dyn Notifier>,
        mode: SyncMode,
    ) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                connectivity,
                notifier,
                mode,
                drain_lock: Mutex::new(()),
                armed: AtomicBool::new(false),
                reports,
            }),
        }
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.inner.connectivity
    }

    pub fn mode(&self) -> SyncMode {
        self.inner.mode
    }

    /// Reports of every drain that actually ran.
    pub fn subscribe(&self) -> broadcast::Receiver<DrainReport> {
        self.inner.reports.subscribe()
    }

    pub async fn pending(&self) -> SyncResult<u64> {
        Ok(self.inner.store.queue().count().await?)
    }

    /// Deliver a new story, or queue it when that is not possible right now.
    ///
    /// Validation failures, auth failures and non-5xx rejections are
    /// returned. Network failures and 5xx responses queue the story. Offline,
    /// no request is made.
    pub async fn submit(&self, story: NewStory) -> SyncResult<Submission> {
        story.validate()?;

        if !self.inner.connectivity.is_online() {
            debug!(local_id = %story.local_id, "Offline, queueing story");
            return self.enqueue(&story).await;
        }

        match self.inner.api.create_story(&story).await {
            Ok(accepted) => {
                info!(local_id = %story.local_id, "Story delivered");
                Ok(Submission::Delivered(accepted))
            }
            Err(e) if e.is_retryable() => {
                warn!(local_id = %story.local_id, error = %e, "Delivery failed, queueing story");
                self.enqueue(&story).await
            }
            Err(e) => Err(SyncError::Gateway(e)),
        }
    }

    /// Send every queued story once, in order.
    ///
    /// Never fails: per-entry failures are logged and counted, and the entry
    /// stays queued. A drain requested while another is running returns
    /// [`DrainReport::skipped`] immediately.
    pub async fn drain(&self) -> DrainReport {
        let Ok(_guard) = self.inner.drain_lock.try_lock() else {
            debug!("Drain already running, skipping");
            return DrainReport::skipped();
        };
        self.drain_queue().await
    }

    /// Drain body. Callers hold `drain_lock`.
    async fn drain_queue(&self) -> DrainReport {
        let queue = self.inner.store.queue();
        let entries = match queue.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to read pending queue");
                return DrainReport::default();
            }
        };

        let mut report = DrainReport {
            attempted: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            match self.inner.api.create_story(&entry.story).await {
                Ok(_) => {
                    report.delivered += 1;
                    match queue.delete(entry.seq).await {
                        Ok(_) => debug!(seq = entry.seq, "Queued story delivered"),
                        Err(e) => error!(
                            seq = entry.seq,
                            error = %e,
                            "Failed to remove delivered story (it will be sent again)"
                        ),
                    }
                    self.inner
                        .notifier
                        .notify(Notification::sync_success(&entry.story.description));
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(seq = entry.seq, error = %e, "Failed to deliver queued story");
                }
            }
        }

        report.remaining = match queue.count().await {
            Ok(count) => count as usize,
            Err(_) => report.attempted - report.delivered,
        };

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                delivered = report.delivered,
                failed = report.failed,
                remaining = report.remaining,
                "Queue drained"
            );
        }
        let _ = self.inner.reports.send(report);
        report
    }

    /// Drain on every offline-to-online transition. Runs until the
    /// connectivity signal is dropped; spawn it and abort to stop.
    pub async fn listen(&self) {
        let mut rx = self.inner.connectivity.subscribe();
        info!(mode = ?self.inner.mode, "Sync listener started");

        while rx.changed().await.is_ok() {
            let online = *rx.borrow_and_update();
            if online {
                info!("Connectivity restored, draining queue");
                self.drain().await;
            }
        }
    }

    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.listen().await })
    }

    async fn enqueue(&self, story: &NewStory) -> SyncResult<Submission> {
        let entry = self.inner.store.queue().enqueue(story).await?;
        info!(seq = entry.seq, local_id = %story.local_id, "Story queued");
        self.schedule_background_drain();
        Ok(Submission::Queued { seq: entry.seq })
    }

    /// In [`SyncMode::Background`], arm a one-shot task that drains on the
    /// next online signal. At most one task is armed at a time; it disarms
    /// before draining so a story queued during the drain arms the next one.
    /// The task waits for a drain already in progress instead of skipping,
    /// since that drain may have read the queue before the story landed.
    /// Does nothing in [`SyncMode::Foreground`].
    pub fn schedule_background_drain(&self) {
        if self.inner.mode != SyncMode::Background {
            return;
        }
        if self
            .inner
            .armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.inner.connectivity.wait_online().await;
            this.inner.armed.store(false, Ordering::SeqCst);
            let _guard = this.inner.drain_lock.lock().await;
            this.drain_queue().await;
        });
        debug!("Background drain armed");
    }
}
