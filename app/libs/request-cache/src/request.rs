//! Requests as seen by the interceptor.

use reqwest::Method;
use url::Url;

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    #[default]
    Cors,
    NoCors,
    SameOrigin,
}

/// What the response will be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    #[default]
    Empty,
}

/// A request routed through the interceptor.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub mode: RequestMode,
    pub destination: Destination,
    pub body: Option<Vec<u8>>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            mode: RequestMode::default(),
            destination: Destination::default(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level page load.
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }

    /// Page loads: navigation, a document destination, or an HTML `Accept`.
    pub fn expects_document(&self) -> bool {
        self.mode == RequestMode::Navigate
            || self.destination == Destination::Document
            || self.accepts("text/html")
    }

    /// Structured-data calls: an `/api/` path or a JSON `Accept`.
    pub fn expects_json(&self) -> bool {
        self.url.path().contains("/api/") || self.accepts("application/json")
    }

    /// Key the response is cached under: the full URL without fragment.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }

    /// Same resource without its query string, when that differs from the
    /// cache key.
    pub fn path_variant(&self) -> Option<String> {
        self.url.query()?;
        let mut bare = self.url.clone();
        bare.set_query(None);
        Some(cache_key(&bare))
    }

    fn accepts(&self, media_type: &str) -> bool {
        self.header("accept")
            .map(|accept| accept.contains(media_type))
            .unwrap_or(false)
    }
}

pub(crate) fn cache_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cache_key_drops_fragment() {
        let request = InterceptedRequest::get(url("http://localhost:9000/app.css#top"));
        assert_eq!(request.cache_key(), "http://localhost:9000/app.css");
    }

    #[test]
    fn test_navigation_expects_document() {
        let request = InterceptedRequest::navigate(url("http://localhost:9000/#/saved"));
        assert!(request.expects_document());
        assert!(!request.expects_json());
    }

    #[test]
    fn test_accept_header_selects_kind() {
        let html = InterceptedRequest::get(url("http://localhost:9000/about"))
            .with_header("Accept", "text/html,application/xhtml+xml");
        assert!(html.expects_document());

        let json = InterceptedRequest::get(url("http://localhost:9000/stories"))
            .with_header("ACCEPT", "application/json");
        assert!(json.expects_json());
        assert!(!json.expects_document());
    }

    #[test]
    fn test_api_path_expects_json() {
        let request = InterceptedRequest::get(url("http://localhost:9000/api/stories"));
        assert!(request.expects_json());
    }

    #[test]
    fn test_path_variant_only_with_query() {
        let plain = InterceptedRequest::get(url("http://localhost:9000/app.bundle.js"));
        assert_eq!(plain.path_variant(), None);

        let busted = InterceptedRequest::get(url("http://localhost:9000/app.bundle.js?v=3"));
        assert_eq!(
            busted.path_variant().as_deref(),
            Some("http://localhost:9000/app.bundle.js")
        );
    }

    #[test]
    fn test_only_get_is_read() {
        assert!(InterceptedRequest::get(url("http://a/")).is_read());
        assert!(!InterceptedRequest::new(Method::POST, url("http://a/")).is_read());
        assert!(!InterceptedRequest::new(Method::HEAD, url("http://a/")).is_read());
    }
}
