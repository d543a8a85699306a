//! Behavioural tests for the interceptor using a scripted in-process network.

use async_trait::async_trait;
use request_cache::{
    CacheConfig, CacheStorage, CapturedResponse, FetchError, FetchResult, Fetcher,
    InterceptedRequest, MemoryCacheStorage, Method, RequestInterceptor, ResponseSource,
    ShellManifest, Url,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

const ORIGIN: &str = "http://localhost:9000";

/// Network double: routes by URL, records every call, can go offline.
struct ScriptedNetwork {
    routes: Mutex<HashMap<String, CapturedResponse>>,
    offline: AtomicBool,
    calls: mpsc::UnboundedSender<String>,
}

impl ScriptedNetwork {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let network = Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            calls: tx,
        });
        (network, rx)
    }

    fn route(&self, path: &str, response: CapturedResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), response);
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for ScriptedNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> FetchResult<CapturedResponse> {
        let _ = self.calls.send(request.url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".to_string()));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| CapturedResponse::new(404, "not found")))
    }
}

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn config(version: &str) -> CacheConfig {
    CacheConfig::new("story-app", version, Url::parse(ORIGIN).unwrap())
}

fn interceptor(
    storage: Arc<MemoryCacheStorage>,
    network: Arc<ScriptedNetwork>,
    version: &str,
) -> RequestInterceptor {
    RequestInterceptor::new(config(version), storage, network)
}

async fn next_call(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a network call")
        .expect("network dropped")
}

async fn wait_for_body(storage: &MemoryCacheStorage, cache: &str, path: &str, body: &str) {
    let key = url(path).to_string();
    for _ in 0..100 {
        if let Some(entry) = storage.get(cache, &key).await.unwrap() {
            if entry.response.text() == body {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("cache never held {body:?} for {path}");
}

#[tokio::test]
async fn test_hit_serves_cached_copy_and_refreshes_once() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, mut calls) = ScriptedNetwork::new();
    let interceptor = interceptor(storage.clone(), network.clone(), "v1");

    network.route("/app.css", CapturedResponse::new(200, "body { color: red }"));
    let first = interceptor
        .handle(InterceptedRequest::get(url("/app.css")))
        .await
        .unwrap();
    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(next_call(&mut calls).await, url("/app.css").to_string());

    network.route("/app.css", CapturedResponse::new(200, "body { color: blue }"));
    let hit = interceptor
        .handle(InterceptedRequest::get(url("/app.css")))
        .await
        .unwrap();
    assert_eq!(hit.source, ResponseSource::Cache);
    assert_eq!(hit.response.text(), "body { color: red }");

    // Exactly one background fetch per hit.
    assert_eq!(next_call(&mut calls).await, url("/app.css").to_string());
    wait_for_body(&storage, "story-app-v1", "/app.css", "body { color: blue }").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(calls.try_recv().is_err());

    let refreshed = interceptor
        .handle(InterceptedRequest::get(url("/app.css")))
        .await
        .unwrap();
    assert_eq!(refreshed.source, ResponseSource::Cache);
    assert_eq!(refreshed.response.text(), "body { color: blue }");
}

#[tokio::test]
async fn test_failed_refresh_keeps_cached_copy() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, mut calls) = ScriptedNetwork::new();
    let interceptor = interceptor(storage.clone(), network.clone(), "v1");

    network.route("/app.bundle.js", CapturedResponse::new(200, "bundle"));
    interceptor
        .handle(InterceptedRequest::get(url("/app.bundle.js")))
        .await
        .unwrap();
    next_call(&mut calls).await;

    network.set_offline(true);
    let hit = interceptor
        .handle(InterceptedRequest::get(url("/app.bundle.js")))
        .await
        .unwrap();
    assert_eq!(hit.source, ResponseSource::Cache);
    next_call(&mut calls).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let entry = storage
        .get("story-app-v1", url("/app.bundle.js").as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "bundle");
}

#[tokio::test]
async fn test_only_plain_ok_is_cached() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    let interceptor = interceptor(storage.clone(), network.clone(), "v1");

    network.route("/created", CapturedResponse::new(201, "created"));
    network.route("/broken", CapturedResponse::new(500, "boom"));

    for path in ["/created", "/broken", "/missing"] {
        let served = interceptor
            .handle(InterceptedRequest::get(url(path)))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_ne!(served.status(), 200);
    }

    let info = interceptor.cache_info().await.unwrap();
    assert_eq!(info.count, 0);

    // A later offline read is not answered with any of those responses.
    network.set_offline(true);
    let offline = interceptor
        .handle(InterceptedRequest::get(url("/broken")))
        .await
        .unwrap();
    assert_eq!(offline.source, ResponseSource::Fallback);
    assert_eq!(offline.status(), 503);
}

#[tokio::test]
async fn test_install_is_best_effort() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.route("/", CapturedResponse::new(200, "<html>root</html>"));
    network.route("/index.html", CapturedResponse::new(200, "<html>index</html>"));

    let interceptor = interceptor(storage.clone(), network.clone(), "v1").with_manifest(
        ShellManifest::new(["/", "/index.html", "/missing.png"]),
    );
    let report = interceptor.install().await.unwrap();

    assert_eq!(report.cache_name, "story-app-v1");
    assert_eq!(report.cached.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].url.ends_with("/missing.png"));
    assert!(!report.is_complete());

    let info = interceptor.cache_info().await.unwrap();
    assert_eq!(info.count, 2);
    assert!(info.cached_urls.contains(&url("/index.html").to_string()));
}

#[tokio::test]
async fn test_install_offline_still_creates_generation() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.set_offline(true);

    let report = interceptor(storage.clone(), network, "v1")
        .install()
        .await
        .unwrap();

    assert!(report.cached.is_empty());
    assert_eq!(report.failed.len(), ShellManifest::default().len());
    assert_eq!(storage.cache_names().await.unwrap(), vec!["story-app-v1"]);
}

#[tokio::test]
async fn test_activation_evicts_older_generations() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.route("/index.html", CapturedResponse::new(200, "old shell"));
    let manifest = ShellManifest::new(["/index.html"]);

    let old = interceptor(storage.clone(), network.clone(), "v1").with_manifest(manifest.clone());
    old.install().await.unwrap();
    old.activate().await.unwrap();

    network.route("/index.html", CapturedResponse::new(200, "new shell"));
    let new = interceptor(storage.clone(), network.clone(), "v2").with_manifest(manifest);
    new.install().await.unwrap();
    let deleted = new.activate().await.unwrap();

    assert_eq!(deleted, vec!["story-app-v1"]);
    assert_eq!(storage.cache_names().await.unwrap(), vec!["story-app-v2"]);

    network.set_offline(true);
    let served = new
        .handle(InterceptedRequest::navigate(url("/saved")))
        .await
        .unwrap();
    assert_eq!(served.response.text(), "new shell");
}

#[tokio::test]
async fn test_offline_navigation_gets_shell_document() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.route("/index.html", CapturedResponse::new(200, "<html>shell</html>"));

    let interceptor = interceptor(storage, network.clone(), "v1")
        .with_manifest(ShellManifest::new(["/index.html"]));
    interceptor.install().await.unwrap();
    network.set_offline(true);

    let served = interceptor
        .handle(InterceptedRequest::navigate(url("/about")))
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.status(), 200);
    assert_eq!(served.response.text(), "<html>shell</html>");
}

#[tokio::test]
async fn test_offline_navigation_without_shell_gets_offline_page() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.set_offline(true);

    let served = interceptor(storage, network, "v1")
        .handle(InterceptedRequest::navigate(url("/")))
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.status(), 503);
    assert!(served
        .response
        .header("content-type")
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_offline_json_read_gets_offline_marker() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.set_offline(true);

    let served = interceptor(storage, network, "v1")
        .handle(
            InterceptedRequest::get(url("/v1/stories"))
                .with_header("Accept", "application/json"),
        )
        .await
        .unwrap();

    assert_eq!(served.status(), 503);
    let body: serde_json::Value = serde_json::from_slice(&served.response.body).unwrap();
    assert_eq!(body["error"], "offline");
}

#[tokio::test]
async fn test_offline_read_tries_path_without_query() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, _calls) = ScriptedNetwork::new();
    network.route("/app.css", CapturedResponse::new(200, "css"));
    let interceptor = interceptor(storage, network.clone(), "v1")
        .with_manifest(ShellManifest::new(["/app.css"]));
    interceptor.install().await.unwrap();
    network.set_offline(true);

    let served = interceptor
        .handle(InterceptedRequest::get(url("/app.css?v=42")))
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.response.text(), "css");
}

#[tokio::test]
async fn test_non_read_requests_bypass_cache() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let (network, mut calls) = ScriptedNetwork::new();
    network.route("/v1/stories", CapturedResponse::new(200, "{}"));
    let interceptor = interceptor(storage, network.clone(), "v1");

    let post = InterceptedRequest::new(Method::POST, url("/v1/stories")).with_body(b"x".to_vec());
    let served = interceptor.handle(post.clone()).await.unwrap();
    assert_eq!(served.source, ResponseSource::Network);
    next_call(&mut calls).await;
    assert_eq!(interceptor.cache_info().await.unwrap().count, 0);

    network.set_offline(true);
    let err = interceptor.handle(post).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}
