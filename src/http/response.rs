//! Response construction.
//!
//! # Responsibilities
//! - Serve exported HTML pages from the dist directory
//! - Build redirect responses
//! - Plain-text fallbacks for unmatched and unimplemented routes
//!
//! # Design Decisions
//! - A missing HTML file is reported as `None` so routing can fall through
//! - Redirects use 307 / 308 so the method and body are preserved

use std::path::{Path, PathBuf};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use url::Url;

use crate::runtime::HandlerError;

/// File backing a page, e.g. `/users/[id]` → `<dist>/users/[id].html`.
pub fn html_path(dist_dir: &Path, page: &str) -> PathBuf {
    dist_dir.join(format!("{}.html", page.trim_start_matches('/')))
}

/// Read a page's HTML and answer with `status`.
pub async fn html_page(
    dist_dir: &Path,
    page: &str,
    status: StatusCode,
) -> Result<Option<Response>, HandlerError> {
    let path = html_path(dist_dir, page);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(
            (
                status,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                bytes,
            )
                .into_response(),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = ?path, "HTML file for matched route is missing");
            Ok(None)
        }
        Err(e) => Err(HandlerError::other(e)),
    }
}

/// 308 when `permanent`, else 307.
pub fn redirect(location: &Url, permanent: bool) -> Response {
    if permanent {
        Redirect::permanent(location.as_str()).into_response()
    } else {
        Redirect::temporary(location.as_str()).into_response()
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

pub fn not_implemented(page: &str) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        format!("No handler registered for API route {page}"),
    )
        .into_response()
}
