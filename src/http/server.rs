//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the manifest handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Swap in recompiled manifests at runtime
//! - Drain background tasks on shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RuntimeConfig, ServerConfig};
use crate::http::handler::{manifest_handler, ApiRoutes};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::signals::shutdown_signal;
use crate::manifest::Manifest;
use crate::observability::metrics;
use crate::routing::{ManifestRouter, Middleware};
use crate::runtime::BackgroundTasks;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ArcSwap<ManifestRouter>>,
    pub api: Arc<ApiRoutes>,
    pub middleware: Option<Arc<dyn Middleware>>,
    pub dist_dir: Arc<PathBuf>,
    pub runtime: RuntimeConfig,
    pub tasks: Arc<BackgroundTasks>,
}

/// HTTP server for an exported app.
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server serving `manifest`.
    pub fn new(config: ServerConfig, manifest: Manifest) -> Self {
        let state = AppState {
            router: Arc::new(ArcSwap::from_pointee(ManifestRouter::new(manifest))),
            api: Arc::new(ApiRoutes::new()),
            middleware: None,
            dist_dir: Arc::new(PathBuf::from(&config.manifest.dist_dir)),
            runtime: config.runtime.clone(),
            tasks: Arc::new(BackgroundTasks::new()),
        };
        Self { config, state }
    }

    /// Register API route handlers.
    pub fn with_api_routes(mut self, api: ApiRoutes) -> Self {
        self.state.api = Arc::new(api);
        self
    }

    /// Install user middleware ahead of routing.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.state.middleware = Some(Arc::new(middleware));
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{*path}", any(manifest_handler))
            .route("/", any(manifest_handler))
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Replace the live manifest.
    pub fn swap_manifest(state: &AppState, manifest: Manifest) {
        let routes = manifest.route_count();
        state.router.store(Arc::new(ManifestRouter::new(manifest)));
        metrics::record_manifest_reload();
        tracing::info!(routes, "Manifest swapped");
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut manifest_updates: mpsc::UnboundedReceiver<Manifest>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_state = self.state.clone();
        let reload = tokio::spawn(async move {
            while let Some(manifest) = manifest_updates.recv().await {
                Self::swap_manifest(&reload_state, manifest);
            }
        });

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        reload.abort();

        let drain = Duration::from_secs(self.config.timeouts.drain_secs);
        if tokio::time::timeout(drain, self.state.tasks.drain()).await.is_err() {
            tracing::warn!(
                drain_secs = self.config.timeouts.drain_secs,
                "Background tasks aborted at shutdown deadline"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared state, e.g. for swapping manifests from outside.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
