//! Server runtime subsystem: per-request ambient context.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → scope.rs (factory resolves environment / origin / waitUntil once)
//!     → handler future runs with the scope installed task-locally
//!         → environment() / origin() read the scope
//!         → run_task() starts work now, hands it to waitUntil
//!         → defer_task() queues work for after the response
//!     → Ok(response): deferred tasks flushed through waitUntil
//!     → Err(StatusError): converted to a response, deferred tasks dropped
//!     → Err(other): propagated to the host
//! ```
//!
//! # Design Decisions
//! - Scope lives in a Tokio task-local, never in process-global state
//! - Spawned tasks inherit their request's scope
//! - Only status errors are turned into responses

pub mod error;
pub mod scope;
pub mod tasks;

pub use error::{BoxError, HandlerError, RuntimeError, StatusBody, StatusError};
pub use scope::{
    create_request_scope, defer_task, environment, origin, run_task, RequestScope,
    ScopeDefinition,
};
pub use tasks::{BackgroundTasks, NoopWaitUntil, TaskResult, WaitUntil};
