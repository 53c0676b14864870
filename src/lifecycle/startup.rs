//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics when enabled
//! - Load and compile the route manifest
//! - Start the manifest watcher when hot reload is on
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when routes are ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::http::{ApiRoutes, HttpServer};
use crate::lifecycle::Shutdown;
use crate::manifest::watcher::ManifestWatcher;
use crate::manifest::{load_manifest, ManifestError};
use crate::observability::metrics;

/// Error type for server startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load manifest {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: ManifestError,
    },

    #[error("Failed to watch manifest: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start serving `config` until `shutdown` fires or a signal arrives.
pub async fn start(config: ServerConfig, api: ApiRoutes, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let manifest_file = config.manifest_file();
    let manifest = load_manifest(&manifest_file).map_err(|source| StartupError::Manifest {
        path: manifest_file.display().to_string(),
        source,
    })?;
    tracing::info!(
        path = %manifest_file.display(),
        routes = manifest.route_count(),
        "Manifest loaded"
    );

    // Kept alive for as long as the server runs.
    let (_watcher, updates) = if config.manifest.watch {
        let (watcher, updates) = ManifestWatcher::new(&manifest_file);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        dist_dir = %config.manifest.dist_dir,
        api_handlers = api.len(),
        "Listening for connections"
    );

    let server = HttpServer::new(config, manifest).with_api_routes(api);
    server.run(listener, updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
