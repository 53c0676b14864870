//! Manifest-driven request handling.
//!
//! # Data Flow
//! ```text
//! Request
//!     → request scope (environment / origin / waitUntil)
//!     → user middleware (if its matcher selects the request)
//!     → redirects  → 307 / 308 + Location
//!     → rewrites   → request URL replaced, continue
//!     → html routes (GET / HEAD) → <dist>/<page>.html
//!     → api routes → registered ApiHandler
//!     → not-found routes (GET / HEAD) → <dist>/<page>.html with 404
//!     → plain 404
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::http::request::{request_id, request_origin, request_url};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::matcher::should_run_for;
use crate::routing::{get_redirect_rewrite_location, parse_params, ManifestRouter, Params, RouteKind};
use crate::runtime::{create_request_scope, HandlerError, ScopeDefinition, WaitUntil};

/// Server-side implementation of an API route.
pub trait ApiHandler: Send + Sync {
    fn call(&self, request: Request<Body>, params: Params) -> BoxFuture<'static, Result<Response, HandlerError>>;
}

impl<F, Fut> ApiHandler for F
where
    F: Fn(Request<Body>, Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    fn call(&self, request: Request<Body>, params: Params) -> BoxFuture<'static, Result<Response, HandlerError>> {
        Box::pin(self(request, params))
    }
}

/// API handlers keyed by route page, e.g. `/api/users/[id]`.
#[derive(Clone, Default)]
pub struct ApiRoutes {
    handlers: HashMap<String, Arc<dyn ApiHandler>>,
}

impl ApiRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, page: impl Into<String>, handler: impl ApiHandler + 'static) -> Self {
        self.handlers.insert(page.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, page: &str) -> Option<Arc<dyn ApiHandler>> {
        self.handlers.get(page).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn tagged(mut response: Response, kind: RouteKind) -> Response {
    response.extensions_mut().insert(kind);
    response
}

fn serves_html(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// Main handler. Runs the routing pipeline inside a request scope.
pub async fn manifest_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let origin = request_origin(request.headers(), state.runtime.origin.as_deref());
    let definition = ScopeDefinition {
        environment: state.runtime.environment.clone(),
        origin: origin.clone(),
        wait_until: Some(state.tasks.clone() as Arc<dyn WaitUntil>),
    };
    let scope = create_request_scope(move || definition.clone());

    let router = state.router.load_full();
    let response = match scope.run(dispatch(&state, &router, request, origin)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Request handler failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    };

    let kind = response
        .extensions()
        .get::<RouteKind>()
        .map(RouteKind::as_str)
        .unwrap_or("none");
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        route = kind,
        "Request handled"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), kind, start_time);

    response
}

async fn dispatch(
    state: &AppState,
    router: &ManifestRouter,
    mut request: Request<Body>,
    origin: Option<String>,
) -> Result<Response, HandlerError> {
    if let Some(middleware) = &state.middleware {
        let (parts, body) = request.into_parts();
        if should_run_for(&parts.method, parts.uri.path(), middleware.settings()) {
            if let Some(response) = middleware.handle(&parts).await? {
                return Ok(response);
            }
        }
        request = Request::from_parts(parts, body);
    }

    let url = request_url(request.uri(), origin.as_deref()).map_err(HandlerError::other)?;
    let method = request.method().clone();

    if let Some(route) = router.find_redirect(request.uri().path(), method.as_str()) {
        let location = get_redirect_rewrite_location(&url, &request, route);
        tracing::debug!(from = %url, to = %location, "Redirecting");
        return Ok(tagged(
            response::redirect(&location, route.permanent.unwrap_or(false)),
            RouteKind::Redirect,
        ));
    }

    if let Some(route) = router.find_rewrite(request.uri().path(), method.as_str()) {
        let location = get_redirect_rewrite_location(&url, &request, route);
        let target = match location.query() {
            Some(query) => format!("{}?{}", location.path(), query),
            None => location.path().to_string(),
        };
        tracing::debug!(from = %url, to = %target, "Rewriting");
        *request.uri_mut() = target.parse::<Uri>().map_err(HandlerError::other)?;
    }

    let pathname = request.uri().path().to_string();

    if serves_html(&method) {
        if let Some(route) = router.find_html(&pathname) {
            if let Some(page) = response::html_page(&state.dist_dir, &route.page, StatusCode::OK).await? {
                return Ok(tagged(page, RouteKind::Html));
            }
        }
    }

    if let Some(route) = router.find_api(&pathname) {
        let params = parse_params(&request, route);
        let response = match state.api.get(&route.page) {
            Some(handler) => handler.call(request, params).await?,
            None => {
                tracing::warn!(page = %route.page, "API route matched without a registered handler");
                response::not_implemented(&route.page)
            }
        };
        return Ok(tagged(response, RouteKind::Api));
    }

    if serves_html(&method) {
        if let Some(route) = router.find_not_found(&pathname) {
            if let Some(page) =
                response::html_page(&state.dist_dir, &route.page, StatusCode::NOT_FOUND).await?
            {
                return Ok(tagged(page, RouteKind::NotFound));
            }
        }
    }

    Ok(response::not_found())
}
