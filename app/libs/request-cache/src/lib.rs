//! # Request Cache
//!
//! Interception layer for shell assets and API reads:
//!
//! - **install** pre-populates the application shell into a named,
//!   version-qualified cache generation;
//! - **activate** deletes every other generation;
//! - **handle** serves reads stale-while-revalidate (cached copy now, one
//!   detached refresh) with offline fallbacks, and passes every other method
//!   straight to the network.
//!
//! Storage sits behind [`CacheStorage`] ([`MemoryCacheStorage`],
//! [`SqliteCacheStorage`]); the network behind [`Fetcher`] ([`HttpFetcher`]).

mod error;
pub mod fallback;
mod fetcher;
mod interceptor;
pub mod manifest;
mod request;
mod response;
mod sqlite;
mod storage;

pub use error::{CacheError, CacheResult, FetchError, FetchResult};
pub use fetcher::{Fetcher, HttpFetcher};
pub use interceptor::{CacheConfig, CacheInfo, InstallFailure, InstallReport, RequestInterceptor};
pub use manifest::ShellManifest;
pub use request::{Destination, InterceptedRequest, RequestMode};
pub use response::{CachedEntry, CapturedResponse, ResponseSource, ServedResponse, SOURCE_HEADER};
pub use sqlite::SqliteCacheStorage;
pub use storage::{CacheStorage, MemoryCacheStorage};

pub use reqwest::Method;
pub use url::Url;
