//! Stale-while-revalidate interception over a single cache generation.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{CacheResult, FetchResult};
use crate::fallback::offline_response;
use crate::fetcher::Fetcher;
use crate::manifest::{ShellManifest, SHELL_DOCUMENTS};
use crate::request::{cache_key, InterceptedRequest};
use crate::response::{CachedEntry, CapturedResponse, ResponseSource, ServedResponse};
use crate::storage::CacheStorage;

/// Identity of the cache generation and the origin the shell is served from.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub prefix: String,
    pub version: String,
    pub origin: Url,
}

impl CacheConfig {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>, origin: Url) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
            origin,
        }
    }

    /// `{prefix}-{version}`, e.g. `story-app-v1`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.prefix, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of pre-populating the shell.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: Vec<String>,
    pub failed: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub cache_name: String,
    pub cached_urls: Vec<String>,
    pub count: usize,
}

/// Answers requests from the current cache generation, keeping it fresh in
/// the background, and synthesizes offline responses when both cache and
/// network fail.
pub struct RequestInterceptor {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    manifest: ShellManifest,
    origin: Url,
    cache_name: String,
}

impl RequestInterceptor {
    pub fn new(
        config: CacheConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            cache_name: config.cache_name(),
            origin: config.origin,
            storage,
            fetcher,
            manifest: ShellManifest::default(),
        }
    }

    pub fn with_manifest(mut self, manifest: ShellManifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Fetch every shell asset into the current generation. Individual
    /// failures are reported, never fatal; only a storage failure opening the
    /// cache aborts.
    pub async fn install(&self) -> CacheResult<InstallReport> {
        self.storage.open(&self.cache_name).await?;

        let urls = self.manifest.resolve(&self.origin);
        let outcomes = join_all(urls.into_iter().map(|url| async move {
            let request = InterceptedRequest::get(url);
            let outcome = self.precache(&request).await;
            (request.cache_key(), outcome)
        }))
        .await;

        let mut report = InstallReport {
            cache_name: self.cache_name.clone(),
            ..Default::default()
        };
        for (url, outcome) in outcomes {
            match outcome {
                Ok(()) => report.cached.push(url),
                Err(reason) => {
                    warn!(url = %url, reason = %reason, "Shell asset not cached");
                    report.failed.push(InstallFailure { url, reason });
                }
            }
        }

        info!(
            cache = %self.cache_name,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Shell installed"
        );
        Ok(report)
    }

    /// Delete every cache generation except the current one. Returns the
    /// deleted names.
    pub async fn activate(&self) -> CacheResult<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.cache_names().await? {
            if name != self.cache_name && self.storage.delete_cache(&name).await? {
                deleted.push(name);
            }
        }

        info!(cache = %self.cache_name, deleted = ?deleted, "Cache generation activated");
        Ok(deleted)
    }

    /// Serve a request.
    ///
    /// Reads (`GET`) never fail: they are answered from the cache (with a
    /// detached refresh), the network, or a fallback. Every other method
    /// goes straight to the network and its transport error is returned.
    pub async fn handle(&self, request: InterceptedRequest) -> FetchResult<ServedResponse> {
        if !request.is_read() {
            debug!(method = %request.method, url = %request.url, "Passing request through");
            let response = self.fetcher.fetch(&request).await?;
            return Ok(ServedResponse {
                response,
                source: ResponseSource::Network,
            });
        }

        Ok(self.handle_read(request).await)
    }

    pub async fn cache_info(&self) -> CacheResult<CacheInfo> {
        let cached_urls = self.storage.keys(&self.cache_name).await?;
        Ok(CacheInfo {
            cache_name: self.cache_name.clone(),
            count: cached_urls.len(),
            cached_urls,
        })
    }

    async fn handle_read(&self, request: InterceptedRequest) -> ServedResponse {
        let key = request.cache_key();

        if let Some(entry) = self.lookup(&key).await {
            debug!(url = %key, "Cache hit");
            self.spawn_refresh(request);
            return ServedResponse {
                response: entry.response,
                source: ResponseSource::Cache,
            };
        }

        match fetch_and_store(&*self.storage, &*self.fetcher, &self.cache_name, &request).await {
            Ok(response) => ServedResponse {
                response,
                source: ResponseSource::Network,
            },
            Err(e) => {
                debug!(url = %key, error = %e, "Network failed, applying fallback");
                self.fallback(&request).await
            }
        }
    }

    async fn fallback(&self, request: &InterceptedRequest) -> ServedResponse {
        if request.expects_document() {
            for document in SHELL_DOCUMENTS {
                let Ok(url) = self.origin.join(document) else {
                    continue;
                };
                if let Some(entry) = self.lookup(&cache_key(&url)).await {
                    return served_fallback(entry.response);
                }
            }
        }

        if let Some(variant) = request.path_variant() {
            if let Some(entry) = self.lookup(&variant).await {
                debug!(url = %variant, "Serving path variant");
                return served_fallback(entry.response);
            }
        }

        served_fallback(offline_response(request))
    }

    async fn lookup(&self, url: &str) -> Option<CachedEntry> {
        match self.storage.get(&self.cache_name, url).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = %url, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// One network call whose only effect is updating the cache.
    fn spawn_refresh(&self, request: InterceptedRequest) {
        let storage = Arc::clone(&self.storage);
        let fetcher = Arc::clone(&self.fetcher);
        let cache_name = self.cache_name.clone();

        tokio::spawn(async move {
            if let Err(e) = fetch_and_store(&*storage, &*fetcher, &cache_name, &request).await {
                debug!(url = %request.url, error = %e, "Background refresh failed");
            }
        });
    }

    async fn precache(&self, request: &InterceptedRequest) -> Result<(), String> {
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| e.to_string())?;
        if !response.is_cacheable() {
            return Err(format!("unexpected status {}", response.status));
        }
        self.storage
            .put(&self.cache_name, &request.cache_key(), &response)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Fetch from the network and store the response when it is a plain 200.
/// Storage failures are logged; the response is returned regardless.
async fn fetch_and_store(
    storage: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
    cache_name: &str,
    request: &InterceptedRequest,
) -> FetchResult<CapturedResponse> {
    let response = fetcher.fetch(request).await?;
    let key = request.cache_key();

    if response.is_cacheable() {
        match storage.put(cache_name, &key, &response).await {
            Ok(()) => debug!(url = %key, "Response cached"),
            Err(e) => warn!(url = %key, error = %e, "Failed to cache response"),
        }
    } else {
        debug!(url = %key, status = response.status, "Response not cached");
    }
    Ok(response)
}

fn served_fallback(response: CapturedResponse) -> ServedResponse {
    ServedResponse {
        response,
        source: ResponseSource::Fallback,
    }
}
