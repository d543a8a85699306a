//! # Local Store
//!
//! Durable, versioned local database behind the offline story engine. It
//! holds three independent collections:
//!
//! - **stories**: remote-confirmed stories keyed by server id, mirrored from
//!   every successful feed load (upsert, never replace);
//! - **queued_stories**: the write-ahead queue of pending submissions keyed
//!   by an auto-assigned sequence number;
//! - **bookmarks**: user-saved story snapshots keyed by story id, with a
//!   lifetime independent of the stories collection.
//!
//! The store is backed by SQLite. Opening is lazy and memoized: the first
//! operation (or an explicit [`LocalStore::open`]) connects and runs the
//! additive schema upgrade; concurrent first callers share that single
//! initialization.
//!
//! ```rust,no_run
//! use local_store::{LocalStore, StoreConfig};
//!
//! # async fn demo() -> local_store::StoreResult<()> {
//! let store = LocalStore::open(StoreConfig::file("story-app.db")).await?;
//! let cached = store.stories().get_all().await?;
//! let pending = store.queue().count().await?;
//! # Ok(())
//! # }
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

mod bookmarks;
mod error;
mod queue;
mod rows;
pub mod schema;
mod stories;

pub use bookmarks::Bookmarks;
pub use error::{StoreError, StoreResult};
pub use queue::Queue;
pub use stories::Stories;

use story_model::StorageInfo;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite file, created on first open.
    File(PathBuf),
    /// Private in-memory database, lost when the store is dropped.
    InMemory,
}

/// Local store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub max_connections: u32,
    /// How long a writer waits for a competing writer before failing.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            // A second connection would open a different empty database.
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct Inner {
    config: StoreConfig,
    pool: OnceCell<SqlitePool>,
    initializations: AtomicUsize,
}

/// Handle to the local database. Cheap to clone; clones share one pool.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

impl LocalStore {
    /// Create a handle without touching the disk. The database is opened by
    /// the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pool: OnceCell::new(),
                initializations: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a handle and open the database eagerly.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        let store = Self::new(config);
        store.pool().await?;
        Ok(store)
    }

    /// Stories collection (remote-confirmed, keyed by id).
    pub fn stories(&self) -> Stories<'_> {
        Stories::new(self)
    }

    /// Write-ahead queue of pending submissions.
    pub fn queue(&self) -> Queue<'_> {
        Queue::new(self)
    }

    /// Bookmarks collection (independent snapshots, keyed by story id).
    pub fn bookmarks(&self) -> Bookmarks<'_> {
        Bookmarks::new(self)
    }

    /// Whether the database has been opened successfully.
    pub fn is_open(&self) -> bool {
        self.inner.pool.initialized()
    }

    /// Number of successful initializations. Stays at 1 however many callers
    /// race on the first operation.
    pub fn initializations(&self) -> usize {
        self.inner.initializations.load(Ordering::SeqCst)
    }

    /// Per-collection row counts.
    pub async fn storage_info(&self) -> StoreResult<StorageInfo> {
        let stories = self.stories().count().await?;
        let queued_stories = self.queue().count().await?;
        let bookmarks = self.bookmarks().count().await?;

        Ok(StorageInfo {
            stories,
            queued_stories,
            bookmarks,
            total_items: stories + queued_stories + bookmarks,
        })
    }

    /// Empty all three collections in one transaction.
    pub async fn clear_all(&self) -> StoreResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        for table in schema::COLLECTIONS {
            // Table names come from a fixed list, never from input.
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("All local data cleared");
        Ok(())
    }

    /// Close the pool. Later operations fail with `StorageUnavailable`.
    pub async fn close(&self) {
        if let Some(pool) = self.inner.pool.get() {
            pool.close().await;
        }
    }

    pub(crate) async fn pool(&self) -> StoreResult<&SqlitePool> {
        self.inner
            .pool
            .get_or_try_init(|| async {
                let pool = connect(&self.inner.config).await.map_err(|e| {
                    warn!(error = %e, "Local store failed to open");
                    e
                })?;
                let version = schema::upgrade(&pool).await?;
                self.inner.initializations.fetch_add(1, Ordering::SeqCst);
                info!(
                    location = ?self.inner.config.location,
                    schema_version = version,
                    "Local store opened"
                );
                Ok(pool)
            })
            .await
    }
}

async fn connect(config: &StoreConfig) -> StoreResult<SqlitePool> {
    let pool = match &config.location {
        StoreLocation::File(path) => {
            debug!(path = %path.display(), "Opening local store file");
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(config.busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(options)
                .await?
        }
        StoreLocation::InMemory => {
            let options =
                SqliteConnectOptions::from_str("sqlite::memory:")?.busy_timeout(config.busy_timeout);

            // Keep the single connection alive for the lifetime of the pool.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        }
    };

    Ok(pool)
}
