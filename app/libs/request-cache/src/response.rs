use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete HTTP response: what the network returned, what the cache
/// holds, and what a fallback synthesizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only a plain `200 OK` is ever written to the cache.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A response as stored in a cache generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub url: String,
    pub response: CapturedResponse,
    pub stored_at: DateTime<Utc>,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Current cache generation; a background refresh was started.
    Cache,
    Network,
    /// Shell document, path variant or synthesized offline response.
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::Fallback => "fallback",
        }
    }
}

/// Header carrying [`ResponseSource`] on proxied responses.
pub const SOURCE_HEADER: &str = "x-cache-source";

/// The interceptor's answer to a request.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub response: CapturedResponse,
    pub source: ResponseSource,
}

impl ServedResponse {
    pub fn status(&self) -> u16 {
        self.response.status
    }
}
