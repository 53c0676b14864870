//! Manifest server (v1)
//!
//! Serves an exported app from its route manifest, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌─────────────────────────────────────────────────────────┐
//!                              │                   MANIFEST SERVER                        │
//!                              │                                                          │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐         │
//!     ─────────────────────────┼─▶│  http   │───▶│ runtime │───▶│   routing    │         │
//!                              │  │ server  │    │  scope  │    │  middleware  │         │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘         │
//!                              │                                       │                  │
//!                              │                                       ▼                  │
//!                              │                               ┌──────────────┐          │
//!                              │                               │  redirects   │          │
//!                              │                               │  + rewrites  │          │
//!                              │                               └──────┬───────┘          │
//!                              │                                       │                  │
//!                              │                                       ▼                  │
//!     Client Response          │  ┌─────────┐    ┌─────────┐    ┌──────────────┐         │
//!     ◀────────────────────────┼──│response │◀───│  html   │◀───│  api / 404   │         │
//!                              │  │         │    │  pages  │    │   handlers   │         │
//!                              │  └─────────┘    └─────────┘    └──────────────┘         │
//!                              │                                                          │
//!                              │  ┌────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                 │ │
//!                              │  │  ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌─────────┐ │ │
//!                              │  │  │ config  │ │ manifest │ │observa-  │ │lifecycle│ │ │
//!                              │  │  │         │ │ + watch  │ │ bility   │ │         │ │ │
//!                              │  │  └─────────┘ └──────────┘ └──────────┘ └─────────┘ │ │
//!                              │  └────────────────────────────────────────────────────┘ │
//!                              └─────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use manifest_server::config::validation::validate_config;
use manifest_server::config::{load_config, ServerConfig};
use manifest_server::http::ApiRoutes;
use manifest_server::lifecycle::{start, Shutdown};
use manifest_server::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "manifest-server")]
#[command(about = "Serve an exported app from its route manifest", long_about = None)]
struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of the static export.
    #[arg(short, long)]
    dist: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:3000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Value returned by `environment()`.
    #[arg(long)]
    environment: Option<String>,

    /// Public origin returned by `origin()`.
    #[arg(long)]
    origin: Option<String>,

    /// Recompile routes when the manifest changes.
    #[arg(long)]
    watch: bool,
}

impl Cli {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(dist) = self.dist {
            config.manifest.dist_dir = dist;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if self.environment.is_some() {
            config.runtime.environment = self.environment;
        }
        if self.origin.is_some() {
            config.runtime.origin = self.origin;
        }
        config.manifest.watch |= self.watch;
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    let config = cli.apply(config);

    if let Err(errors) = validate_config(&config) {
        for e in errors {
            eprintln!("Invalid configuration: {e}");
        }
        return ExitCode::FAILURE;
    }

    init_logging(&config.observability);
    tracing::info!("manifest-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        dist_dir = %config.manifest.dist_dir,
        watch = config.manifest.watch,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    match start(config, ApiRoutes::new(), &shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
