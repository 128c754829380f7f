//! Worker spawning and shutdown-aware channel operations

use async_channel::{Receiver, Sender};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use txstorm_resilience::{ShutdownCoordinator, ShutdownError, ShutdownSignal};

/// Receive the next item, or `None` once shutdown is signalled or the
/// channel is closed. Shutdown wins when both are ready.
pub async fn recv_or_shutdown<T>(rx: &Receiver<T>, signal: &ShutdownSignal) -> Option<T> {
    tokio::select! {
        biased;
        _ = signal.triggered() => None,
        item = rx.recv() => item.ok(),
    }
}

/// Send an item, blocking while the channel is full.
///
/// Returns `false` if shutdown was signalled first or the channel is closed;
/// the item is dropped in that case.
pub async fn send_or_shutdown<T>(tx: &Sender<T>, item: T, signal: &ShutdownSignal) -> bool {
    tokio::select! {
        biased;
        _ = signal.triggered() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

/// Set of worker tasks sharing one shutdown coordinator
pub struct WorkerPool {
    shutdown: ShutdownCoordinator,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(shutdown: ShutdownCoordinator) -> Self {
        Self {
            shutdown,
            tasks: JoinSet::new(),
        }
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Spawn `size` workers, building each one from its index
    pub fn spawn<F, Fut>(&mut self, name: &'static str, size: usize, mut worker: F)
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        debug!(pool = name, size, "Starting workers");
        for index in 0..size {
            self.spawn_task(name, index, worker(index));
        }
    }

    /// Spawn a single tracked task
    pub fn spawn_task<Fut>(&mut self, name: &'static str, index: usize, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let guard = self.shutdown.track();
        self.tasks.spawn(async move {
            task.await;
            debug!(pool = name, index, "Worker stopped");
            drop(guard);
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait up to `timeout` for every worker to finish; stragglers are aborted
    pub async fn join_all(mut self, timeout: Duration) -> Result<(), ShutdownError> {
        let waited = self.shutdown.wait_for_tasks(timeout).await;
        if let Err(e) = &waited {
            warn!("Aborting workers: {}", e);
            self.tasks.abort_all();
        }

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!("Worker panicked: {}", e);
                }
            }
        }

        waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_recv_returns_none_on_shutdown() {
        let shutdown = ShutdownCoordinator::new();
        let (_tx, rx) = async_channel::bounded::<u32>(1);
        let signal = shutdown.signal();

        let waiter = tokio::spawn(async move { recv_or_shutdown(&rx, &signal).await });
        tokio::task::yield_now().await;
        shutdown.shutdown();

        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_ready_item() {
        let shutdown = ShutdownCoordinator::new();
        let (tx, rx) = async_channel::bounded::<u32>(1);
        tx.send(7).await.unwrap();
        shutdown.shutdown();

        assert_eq!(recv_or_shutdown(&rx, &shutdown.signal()).await, None);
        assert_eq!(rx.len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_send_released_by_shutdown() {
        let shutdown = ShutdownCoordinator::new();
        let (tx, _rx) = async_channel::bounded::<u32>(1);
        let signal = shutdown.signal();
        tx.send(1).await.unwrap();

        let sender = tokio::spawn(async move { send_or_shutdown(&tx, 2, &signal).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!sender.is_finished());

        shutdown.shutdown();
        assert!(!sender.await.unwrap());
    }

    #[tokio::test]
    async fn test_pool_spawns_and_joins() {
        let shutdown = ShutdownCoordinator::new();
        let mut pool = WorkerPool::new(shutdown.clone());
        let started = Arc::new(AtomicUsize::new(0));

        pool.spawn("test", 4, |_| {
            let started = started.clone();
            let signal = shutdown.signal();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                signal.triggered().await;
            }
        });
        assert_eq!(pool.len(), 4);

        crate::test_support::wait_until(|| started.load(Ordering::SeqCst) == 4).await;
        assert_eq!(shutdown.active_task_count(), 4);

        shutdown.shutdown();
        pool.join_all(Duration::from_secs(1)).await.unwrap();
        assert_eq!(shutdown.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_join_aborts_stragglers() {
        let shutdown = ShutdownCoordinator::new();
        let mut pool = WorkerPool::new(shutdown.clone());
        pool.spawn_task("stuck", 0, std::future::pending::<()>());

        shutdown.shutdown();
        let result = pool.join_all(Duration::from_millis(30)).await;
        assert_eq!(result, Err(ShutdownError::TasksRemaining(1)));
        assert_eq!(shutdown.active_task_count(), 0);
    }
}
