//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Derive the public origin of a request
//! - Rebuild the full request URL for redirect / rewrite computation
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A configured origin always wins over request headers

use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request's ID, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Public origin: configured value, else `<proto>://<host>` from headers.
///
/// A Host header that is not a valid authority yields `None`.
pub fn request_origin(headers: &HeaderMap, configured: Option<&str>) -> Option<String> {
    if let Some(origin) = configured {
        return Some(origin.trim_end_matches('/').to_string());
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let authority = Authority::from_str(host).ok()?;
    if authority.as_str().contains('@') {
        return None;
    }
    let proto = match headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()) {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    let origin = format!("{proto}://{authority}");
    Url::parse(&origin).ok()?;
    Some(origin)
}

/// Full URL of the request against `origin` (defaults to `http://localhost`).
pub fn request_url(uri: &Uri, origin: Option<&str>) -> Result<Url, url::ParseError> {
    let base = origin.unwrap_or("http://localhost").trim_end_matches('/');
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    Url::parse(&format!("{base}{path}"))
}
