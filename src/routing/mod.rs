//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query)
//!     → matcher.rs (should user middleware run?)
//!     → router.rs (first matching redirect / rewrite / html / api / not-found route)
//!     → params.rs (named params, redirect & rewrite targets)
//!     → Return: matched route or explicit no-match
//!
//! Route Compilation (at startup):
//!     RawManifest
//!     → manifest::compile (regex per route)
//!     → Freeze as immutable ManifestRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (manifest order)

pub mod matcher;
pub mod params;
pub mod router;

pub use matcher::{
    matches_pattern, pattern_to_regex, should_run_middleware, MatcherPattern, Middleware,
    MiddlewareMatcher, MiddlewareSettings,
};
pub use params::{get_redirect_rewrite_location, parse_params, Params};
pub use router::{ManifestRouter, RouteKind};
