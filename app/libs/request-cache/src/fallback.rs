//! Synthesized responses for requests that neither the cache nor the network
//! can answer.

use error_types::ErrorResponse;

use crate::request::InterceptedRequest;
use crate::response::CapturedResponse;

pub const OFFLINE_STATUS: u16 = 503;

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Offline - Story App</title>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body { font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #f5f5f5; }
    .offline-message { background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
    .retry-btn { background: #2196f3; color: white; border: none; padding: 10px 20px; border-radius: 5px; cursor: pointer; margin-top: 20px; }
  </style>
</head>
<body>
  <div class="offline-message">
    <h1>Story App</h1>
    <h2>You are offline</h2>
    <p>Check your internet connection and try again.</p>
    <button class="retry-btn" onclick="window.location.reload()">Try again</button>
  </div>
</body>
</html>
"#;

const OFFLINE_TEXT: &str = "Resource is not available offline";

/// The offline response matching what the request expects.
pub fn offline_response(request: &InterceptedRequest) -> CapturedResponse {
    if request.expects_document() {
        offline_page()
    } else if request.expects_json() {
        offline_json()
    } else {
        offline_text()
    }
}

pub fn offline_page() -> CapturedResponse {
    unavailable("text/html; charset=utf-8", OFFLINE_PAGE)
}

pub fn offline_json() -> CapturedResponse {
    unavailable("application/json", ErrorResponse::offline().to_json())
}

pub fn offline_text() -> CapturedResponse {
    unavailable("text/plain", OFFLINE_TEXT)
}

fn unavailable(content_type: &str, body: impl Into<Vec<u8>>) -> CapturedResponse {
    CapturedResponse::new(OFFLINE_STATUS, body)
        .with_header("content-type", content_type)
        .with_header("cache-control", "no-cache")
}
