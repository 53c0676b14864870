//! Production server runtime for exported universal apps.
//!
//! Serves a static export driven by its route manifest (`routes.json`):
//! redirects, rewrites, HTML pages, API handlers and not-found pages, each
//! request running inside its own runtime scope.

pub mod config;
pub mod configset;
pub mod http;
pub mod lifecycle;
pub mod manifest;
pub mod observability;
pub mod routing;
pub mod runtime;

pub use config::schema::ServerConfig;
pub use http::{ApiRoutes, HttpServer};
pub use lifecycle::Shutdown;
pub use manifest::{init_manifest_regexp, load_manifest, Manifest};
