//! Request scope and ambient runtime APIs.
//!
//! # Responsibilities
//! - Resolve per-request facts once at scope entry
//! - Expose them to any code running inside the handler future
//! - Start background tasks now ([`run_task`]) or after the response ([`defer_task`])
//! - Convert [`StatusError`]s into responses
//!
//! # Lifecycle
//! ```text
//! Uninitialized ──run()──▶ Active ──handler settles──▶ Finalizing ──▶ Terminal
//!                                                         │
//!                              Ok: flush deferred tasks ◀─┤
//!                             Err: drop deferred tasks  ◀─┘
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::runtime::error::{HandlerError, RuntimeError};
use crate::runtime::tasks::{NoopWaitUntil, TaskResult, WaitUntil};

tokio::task_local! {
    static REQUEST_SCOPE: Arc<ScopeState>;
}

type DeferredTask = Box<dyn FnOnce() -> BoxFuture<'static, TaskResult> + Send>;

/// Values a host supplies for one request.
#[derive(Default, Clone)]
pub struct ScopeDefinition {
    pub environment: Option<String>,
    pub origin: Option<String>,
    pub wait_until: Option<Arc<dyn WaitUntil>>,
}

struct ScopeState {
    environment: Option<String>,
    origin: Option<String>,
    wait_until: Arc<dyn WaitUntil>,
    deferred: Mutex<Vec<DeferredTask>>,
}

impl ScopeState {
    fn new(definition: ScopeDefinition) -> Self {
        Self {
            environment: definition.environment,
            origin: definition.origin,
            wait_until: definition
                .wait_until
                .unwrap_or_else(|| Arc::new(NoopWaitUntil)),
            deferred: Mutex::new(Vec::new()),
        }
    }

    fn take_deferred(&self) -> Vec<DeferredTask> {
        std::mem::take(&mut *self.deferred.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Hand `task` to the sink, wrapped so it runs inside `state`'s scope and
/// logs its failure or panic.
fn start_task(state: &Arc<ScopeState>, task: BoxFuture<'static, TaskResult>) {
    let supervised = AssertUnwindSafe(task).catch_unwind().map(|outcome| match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Background task failed"),
        Err(_) => tracing::warn!("Background task panicked"),
    });
    state
        .wait_until
        .wait_until(Box::pin(REQUEST_SCOPE.scope(state.clone(), supervised)));
}

fn current(api: &'static str) -> Result<Arc<ScopeState>, RuntimeError> {
    REQUEST_SCOPE
        .try_with(Arc::clone)
        .map_err(|_| RuntimeError::InvalidCall(api))
}

/// Runs handlers inside a fresh request scope.
pub struct RequestScope<F> {
    factory: F,
}

/// Create a scope runner. `factory` is called once per [`RequestScope::run`].
pub fn create_request_scope<F>(factory: F) -> RequestScope<F>
where
    F: Fn() -> ScopeDefinition,
{
    RequestScope { factory }
}

impl<F> RequestScope<F>
where
    F: Fn() -> ScopeDefinition,
{
    /// Run `handler` with the scope installed.
    ///
    /// Status errors come back as `Ok(response)`; every other error is
    /// returned unchanged. Deferred tasks only run when the handler succeeded.
    pub async fn run<Fut>(&self, handler: Fut) -> Result<Response, HandlerError>
    where
        Fut: Future<Output = Result<Response, HandlerError>>,
    {
        let state = Arc::new(ScopeState::new((self.factory)()));
        let result = REQUEST_SCOPE.scope(state.clone(), handler).await;
        let deferred = state.take_deferred();

        match result {
            Ok(response) => {
                for task in deferred {
                    start_task(&state, task());
                }
                Ok(response)
            }
            Err(HandlerError::Status(err)) => {
                if !deferred.is_empty() {
                    tracing::debug!(
                        dropped = deferred.len(),
                        status = %err.status(),
                        "Request failed, discarding deferred tasks"
                    );
                }
                Ok(err.into_response())
            }
            Err(err) => Err(err),
        }
    }
}

/// The hosting environment's identifier.
pub fn environment() -> Result<String, RuntimeError> {
    current("environment")?
        .environment
        .clone()
        .ok_or(RuntimeError::Unsupported("environment"))
}

/// The request's public origin, e.g. `https://example.com`.
pub fn origin() -> Result<String, RuntimeError> {
    current("origin")?
        .origin
        .clone()
        .ok_or(RuntimeError::Unsupported("origin"))
}

/// Start `f` immediately and let the host wait for it.
pub fn run_task<F, Fut>(f: F) -> Result<(), RuntimeError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    let state = current("runTask")?;
    start_task(&state, Box::pin(f()));
    Ok(())
}

/// Queue `f` to start once the response has been produced.
pub fn defer_task<F, Fut>(f: F) -> Result<(), RuntimeError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    let state = current("deferTask")?;
    state
        .deferred
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Box::new(move || Box::pin(f())));
    Ok(())
}
