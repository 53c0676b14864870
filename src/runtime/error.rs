//! Runtime error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use thiserror::Error;

/// Boxed error used at the host boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Misuse of the runtime APIs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Called outside of any request scope.
    #[error("Invalid server runtime API call to {0}(). Runtime APIs can only be called during ongoing requests.")]
    InvalidCall(&'static str),

    /// A scope exists but the host did not provide this capability.
    #[error("Unsupported server runtime API call to {0}(). This API is not available in the current environment.")]
    Unsupported(&'static str),
}

/// Body carried by a [`StatusError`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatusBody {
    Text(String),
    Json(Value),
}

/// An error that maps directly onto an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("status error {status}")]
pub struct StatusError {
    status: StatusCode,
    body: StatusBody,
}

impl StatusError {
    /// Create a status error whose body is the canonical reason phrase.
    pub fn new(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown Error");
        Self {
            status,
            body: StatusBody::Text(reason.to_string()),
        }
    }

    pub fn with_text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: StatusBody::Text(body.into()),
        }
    }

    pub fn with_json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: StatusBody::Json(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &StatusBody {
        &self.body
    }
}

impl Default for StatusError {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        match self.body {
            StatusBody::Text(text) => (
                self.status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response(),
            StatusBody::Json(value) => (self.status, Json(value)).into_response(),
        }
    }
}

/// Error returned by request handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Recovered into a response at the scope boundary.
    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Other(BoxError),
}

impl HandlerError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        HandlerError::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_status_error_response() {
        let response = StatusError::with_text(StatusCode::FORBIDDEN, "nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"nope");
    }

    #[tokio::test]
    async fn test_default_status_error() {
        let err = StatusError::default();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[test]
    fn test_runtime_error_messages() {
        assert!(RuntimeError::InvalidCall("origin")
            .to_string()
            .starts_with("Invalid server runtime API call to origin()"));
        assert!(RuntimeError::Unsupported("environment")
            .to_string()
            .starts_with("Unsupported server runtime API call to environment()"));
    }
}
