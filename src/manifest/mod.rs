//! Route manifest subsystem.
//!
//! # Data Flow
//! ```text
//! routes.json (export pipeline output)
//!     → loader.rs (read & deserialize RawManifest)
//!     → compile.rs (compile every namedRegex)
//!     → Manifest (immutable, shared via Arc)
//!
//! On manifest change:
//!     watcher.rs detects change
//!     → loader.rs loads and compiles the new manifest
//!     → atomic swap in the HTTP server
//! ```
//!
//! # Design Decisions
//! - Compilation is a single pass producing new route tables; nothing is mutated in place
//! - Malformed regex strings fail the whole load (no partial manifests)
//! - Unknown route fields are carried through untouched

pub mod compile;
pub mod loader;
pub mod schema;
pub mod watcher;

pub use compile::{init_manifest_regexp, Manifest, Route};
pub use loader::{load_manifest, ManifestError};
pub use schema::{RawManifest, RouteInfo};
