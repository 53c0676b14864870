//! Background task sinks.
//!
//! A [`WaitUntil`] sink receives one future per started task and is
//! responsible for driving it to completion. Dropping the future cancels
//! the task.

use std::sync::{Mutex, PoisonError};

use futures_util::future::BoxFuture;
use tokio::task::JoinSet;

use crate::runtime::error::BoxError;

/// Outcome of a background task.
pub type TaskResult = Result<(), BoxError>;

/// Host hook for keeping background work alive past the response.
pub trait WaitUntil: Send + Sync {
    fn wait_until(&self, task: BoxFuture<'static, ()>);
}

/// Sink used when the host provides none. Tasks run detached and nobody
/// waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWaitUntil;

impl WaitUntil for NoopWaitUntil {
    fn wait_until(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

/// Tracks background tasks so they can be drained on shutdown.
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Wait for every tracked task to finish. Dropping the returned future
    /// aborts whatever is still running.
    pub async fn drain(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };

        let count = tasks.len();
        if count > 0 {
            tracing::info!(count, "Draining background tasks");
        }
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                tracing::warn!(error = %e, "Background task aborted");
            }
        }
    }
}

impl WaitUntil for BackgroundTasks {
    fn wait_until(&self, task: BoxFuture<'static, ()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished tasks so the set does not grow for the server's lifetime.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let sink = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            sink.wait_until(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }

        sink.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(sink.pending(), 0);
    }

    #[tokio::test]
    async fn test_drain_deadline_aborts_running_tasks() {
        let sink = BackgroundTasks::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let flag = finished.clone();
        sink.wait_until(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(tokio::time::timeout(Duration::from_millis(10), sink.drain()).await.is_err());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_noop_sink_still_runs_task() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        NoopWaitUntil.wait_until(Box::pin(async move {
            let _ = tx.send(());
        }));
        assert!(tokio::time::timeout(Duration::from_secs(1), rx).await.is_ok());
    }
}
