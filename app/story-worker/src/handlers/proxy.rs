//! Everything outside `/app` goes through the request interceptor against
//! the app origin.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::debug;

use request_cache::{Destination, InterceptedRequest, Method, RequestMode, SOURCE_HEADER};

use crate::context::WorkerContext;
use crate::error::{AppError, Result};

const HOP_BY_HOP: [&str; 5] = [
    "connection",
    "content-length",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

pub async fn forward(
    req: HttpRequest,
    body: web::Bytes,
    worker: web::Data<WorkerContext>,
) -> Result<HttpResponse> {
    let request = intercepted(&req, body, worker.interceptor.origin())?;
    debug!(method = %request.method, url = %request.url, "Proxying request");

    let served = worker.interceptor.handle(request).await?;

    let status = StatusCode::from_u16(served.status()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = HttpResponse::build(status);
    for (name, value) in &served.response.headers {
        if HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h)) {
            continue;
        }
        response.append_header((name.as_str(), value.as_str()));
    }
    response.insert_header((SOURCE_HEADER, served.source.as_str()));
    Ok(response.body(served.response.body))
}

fn intercepted(
    req: &HttpRequest,
    body: web::Bytes,
    origin: &request_cache::Url,
) -> Result<InterceptedRequest> {
    // Only path and query are taken from the request; joining would read a
    // `//host/...` path as a reference to another host.
    let mut url = origin.clone();
    url.set_path(req.uri().path());
    url.set_query(req.uri().query());
    let method = Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut request = InterceptedRequest::new(method, url);
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request.mode = match request.header("sec-fetch-mode") {
        Some("navigate") => RequestMode::Navigate,
        Some("no-cors") => RequestMode::NoCors,
        Some("same-origin") => RequestMode::SameOrigin,
        _ => RequestMode::Cors,
    };
    request.destination = match request.header("sec-fetch-dest") {
        Some("document") => Destination::Document,
        Some("script") => Destination::Script,
        Some("style") => Destination::Style,
        Some("image") => Destination::Image,
        Some("font") => Destination::Font,
        Some("manifest") => Destination::Manifest,
        _ => Destination::Empty,
    };
    if !body.is_empty() {
        request = request.with_body(body.to_vec());
    }
    Ok(request)
}
