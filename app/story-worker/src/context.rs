//! The two execution contexts hosted by the process.
//!
//! The page context submits stories and reads the feed; the worker context
//! intercepts requests and drains the queue. Each owns its own components
//! (including its own pool on the shared database file) and they talk only
//! through the store and the [`WorkerMessage`] channel.

use anyhow::{Context as _, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use local_store::{LocalStore, StoreConfig};
use offline_sync::{
    ConnectivityMonitor, DrainReport, FeedLoader, Notifier, Submission, SyncCoordinator,
    SyncMode, SyncResult, TracingNotifier,
};
use request_cache::{CacheConfig, HttpFetcher, InstallReport, RequestInterceptor, SqliteCacheStorage};
use story_gateway::{GatewayConfig, HttpStoryGateway, TokenStore};
use story_model::NewStory;

use crate::config::Config;
use crate::messages::WorkerMessage;

fn gateway(config: &Config, tokens: TokenStore) -> Result<Arc<HttpStoryGateway>> {
    let gateway = HttpStoryGateway::new(
        GatewayConfig {
            base_url: config.api.base_url.clone(),
            timeout: config.api.timeout(),
        },
        tokens,
    )
    .context("failed to build story API client")?;
    Ok(Arc::new(gateway))
}

pub struct WorkerContext {
    pub store: LocalStore,
    pub gateway: Arc<HttpStoryGateway>,
    pub interceptor: Arc<RequestInterceptor>,
    pub coordinator: SyncCoordinator,
    pub connectivity: ConnectivityMonitor,
    pub notifier: Arc<dyn Notifier>,
}

impl WorkerContext {
    pub async fn build(config: &Config, tokens: TokenStore) -> Result<Self> {
        let store = LocalStore::new(StoreConfig::file(&config.database.path));
        let gateway = gateway(config, tokens)?;

        let cache_storage = SqliteCacheStorage::open_file(&config.database.cache_path)
            .await
            .with_context(|| {
                format!(
                    "failed to open cache database {}",
                    config.database.cache_path.display()
                )
            })?;
        let fetcher = HttpFetcher::new(config.api.timeout()).context("failed to build fetcher")?;
        let interceptor = RequestInterceptor::new(
            CacheConfig::new(
                config.cache.prefix.clone(),
                config.cache.version.clone(),
                config.cache.app_origin.clone(),
            ),
            Arc::new(cache_storage),
            Arc::new(fetcher),
        );

        let connectivity = ConnectivityMonitor::new(false);
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        let mode = if config.worker.background_sync {
            SyncMode::Background
        } else {
            SyncMode::Foreground
        };
        let coordinator = SyncCoordinator::new(
            store.clone(),
            gateway.clone(),
            connectivity.clone(),
            notifier.clone(),
            mode,
        );

        Ok(Self {
            store,
            gateway,
            interceptor: Arc::new(interceptor),
            coordinator,
            connectivity,
            notifier,
        })
    }

    /// Install the shell into the current generation and activate it.
    pub async fn install(&self) -> Result<InstallReport> {
        let report = self.interceptor.install().await?;
        self.interceptor.activate().await?;
        Ok(report)
    }
}

pub struct PageContext {
    pub store: LocalStore,
    pub gateway: Arc<HttpStoryGateway>,
    pub coordinator: SyncCoordinator,
    pub feed: FeedLoader,
    pub connectivity: ConnectivityMonitor,
    worker: mpsc::Sender<WorkerMessage>,
}

impl PageContext {
    pub fn build(
        config: &Config,
        tokens: TokenStore,
        worker: mpsc::Sender<WorkerMessage>,
    ) -> Result<Self> {
        let store = LocalStore::new(StoreConfig::file(&config.database.path));
        let gateway = gateway(config, tokens)?;
        let connectivity = ConnectivityMonitor::new(false);
        // Draining belongs to the worker; the page only submits.
        let coordinator = SyncCoordinator::new(
            store.clone(),
            gateway.clone(),
            connectivity.clone(),
            Arc::new(TracingNotifier),
            SyncMode::Foreground,
        );
        let feed = FeedLoader::new(gateway.clone(), store.clone());

        Ok(Self {
            store,
            gateway,
            coordinator,
            feed,
            connectivity,
            worker,
        })
    }

    /// Submit a story; a queued story is handed to the worker for draining.
    pub async fn submit(&self, story: NewStory) -> SyncResult<Submission> {
        let submission = self.coordinator.submit(story).await?;
        if let Submission::Queued { seq } = submission {
            if self.worker.send(WorkerMessage::RegisterSync).await.is_err() {
                warn!(seq, "Worker is gone, story stays queued");
            }
        }
        Ok(submission)
    }

    /// Ask the worker to drain now. `None` when the worker is gone.
    pub async fn sync_now(&self) -> Option<DrainReport> {
        let (reply, rx) = oneshot::channel();
        self.worker
            .send(WorkerMessage::SyncNow { reply: Some(reply) })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn skip_waiting(&self) -> bool {
        let sent = self.worker.send(WorkerMessage::SkipWaiting).await.is_ok();
        if sent {
            info!("Asked worker to skip waiting");
        }
        sent
    }
}
