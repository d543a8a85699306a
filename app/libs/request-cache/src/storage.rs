//! Named cache storage.
//!
//! A backend holds any number of named caches, each mapping a request URL to
//! one response. The interceptor only ever writes to its current generation
//! and deletes the others on activation.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::CacheResult;
use crate::response::{CachedEntry, CapturedResponse};

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named cache if it does not exist.
    async fn open(&self, cache: &str) -> CacheResult<()>;

    /// Store a response, replacing any previous one for the URL. Creates the
    /// cache when missing.
    async fn put(&self, cache: &str, url: &str, response: &CapturedResponse) -> CacheResult<()>;

    async fn get(&self, cache: &str, url: &str) -> CacheResult<Option<CachedEntry>>;

    /// URLs held by the named cache, sorted.
    async fn keys(&self, cache: &str) -> CacheResult<Vec<String>>;

    /// Every cache name, sorted.
    async fn cache_names(&self) -> CacheResult<Vec<String>>;

    /// Drop a cache with all its entries. Returns whether it existed.
    async fn delete_cache(&self, cache: &str) -> CacheResult<bool>;
}

/// Process-local storage, lost on restart.
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<BTreeMap<String, BTreeMap<String, CachedEntry>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, cache: &str) -> CacheResult<()> {
        self.caches
            .write()
            .await
            .entry(cache.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, cache: &str, url: &str, response: &CapturedResponse) -> CacheResult<()> {
        let entry = CachedEntry {
            url: url.to_string(),
            response: response.clone(),
            stored_at: Utc::now(),
        };
        self.caches
            .write()
            .await
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), entry);
        Ok(())
    }

    async fn get(&self, cache: &str, url: &str) -> CacheResult<Option<CachedEntry>> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    async fn keys(&self, cache: &str) -> CacheResult<Vec<String>> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
        Ok(self.caches.write().await.remove(cache).is_some())
    }
}
