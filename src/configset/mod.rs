//! Bundler config composition.
//!
//! # Data Flow
//! ```text
//! base config (JSON tree)
//!     → compose.rs (fold config sets in order)
//!         → proxy.rs (each set mutates through a recording view)
//!         → MetroConfigDelta per set / delete
//!     → final config
//!     → [EXPO_DEBUG=true] one log line per delta, in application order
//! ```
//!
//! # Design Decisions
//! - Config sets mutate in place; returning a different config is rejected
//! - Deltas are kept in strict application order
//! - Intermediate objects created by a dotted `set` are recorded as their own deltas

pub mod compose;
pub mod proxy;

use thiserror::Error;

pub use compose::{
    apply_config_set, create_config, create_config_with_debug, is_debug_enabled, ConfigSet,
    ConfigSetFn,
};
pub use proxy::{ConfigProxy, MetroConfigDelta};

/// Error type for config composition.
#[derive(Debug, Error)]
pub enum ConfigSetError {
    #[error("Config set \"{0}\" returned a value other than the config it received; mutate the config in place and return nothing")]
    UnexpectedReturn(String),

    #[error("Invalid config property path \"{0}\"")]
    InvalidPath(String),

    #[error("Config property \"{0}\" is not an object or array")]
    NotAContainer(String),

    #[error("Config set \"{name}\" failed: {message}")]
    Failed { name: String, message: String },
}
