//! Cooperative shutdown coordination
//!
//! One [`ShutdownCoordinator`] is shared by every task of a run. Tasks hold a
//! [`ShutdownSignal`] and stop at their next suspension point once it fires.
//! A fatal condition calls [`ShutdownCoordinator::abort`], which records the
//! first reason and then triggers the ordinary shutdown.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info, warn};

/// Shutdown error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShutdownError {
    #[error("{0} tasks still active after shutdown timeout")]
    TasksRemaining(usize),
}

/// Cloneable handle that tasks poll or await for shutdown
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested
    pub fn triggered(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[derive(Debug, Default)]
struct Inner {
    token: CancellationToken,
    abort_reason: OnceCell<String>,
    active_tasks: AtomicUsize,
}

/// Shared shutdown state for a pipeline run
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a task to observe shutdown
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            token: self.inner.token.clone(),
        }
    }

    /// Request shutdown. Returns `true` only for the call that triggered it.
    pub fn shutdown(&self) -> bool {
        if self.inner.token.is_cancelled() {
            return false;
        }
        self.inner.token.cancel();
        info!("Shutdown requested");
        true
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Record a fatal condition and shut down.
    ///
    /// Only the first reason is kept; returns `true` if this call set it.
    pub fn abort(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let first = self.inner.abort_reason.set(reason.clone()).is_ok();
        if first {
            error!(reason = %reason, "Aborting run");
        } else {
            debug!(reason = %reason, "Abort already recorded");
        }
        self.inner.token.cancel();
        first
    }

    pub fn aborted(&self) -> bool {
        self.inner.abort_reason.get().is_some()
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.inner.abort_reason.get().map(String::as_str)
    }

    /// Count a running task until the returned guard is dropped
    pub fn track(&self) -> TaskGuard {
        self.inner.active_tasks.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            inner: self.inner.clone(),
        }
    }

    pub fn active_task_count(&self) -> usize {
        self.inner.active_tasks.load(Ordering::Acquire)
    }

    /// Wait for all tracked tasks to finish within `timeout`
    pub async fn wait_for_tasks(&self, timeout: Duration) -> Result<(), ShutdownError> {
        let start = tokio::time::Instant::now();

        loop {
            let active = self.active_task_count();
            if active == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                warn!("Shutdown timeout with {} tasks still active", active);
                return Err(ShutdownError::TasksRemaining(active));
            }

            let sleep_duration = if active > 10 {
                Duration::from_millis(20)
            } else {
                Duration::from_millis(5)
            };
            tokio::time::sleep(sleep_duration).await;
        }
    }
}

/// RAII marker for a tracked task
#[derive(Debug)]
pub struct TaskGuard {
    inner: Arc<Inner>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.inner.active_tasks.fetch_sub(1, Ordering::AcqRel);
    }
}
