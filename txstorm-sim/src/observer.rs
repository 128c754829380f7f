//! Commit observer watching the simulated ledger

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use txstorm_core::{CommitObserver, CoreError, ObserverReport, Result};

use crate::ledger::{BlockEvent, Ledger};

enum State {
    Idle {
        baseline: u64,
        blocks: broadcast::Receiver<BlockEvent>,
    },
    Watching(JoinHandle<Result<ObserverReport>>),
    Done,
}

/// Counts committed transactions block by block.
///
/// Subscribes to the ledger when constructed, so blocks committed between
/// construction and `start` are counted too.
pub struct SimCommitObserver {
    committer: String,
    state: Mutex<State>,
}

impl SimCommitObserver {
    pub fn new(ledger: &Ledger, committer: impl Into<String>) -> Self {
        let (baseline, blocks) = ledger.subscribe();
        Self {
            committer: committer.into(),
            state: Mutex::new(State::Idle { baseline, blocks }),
        }
    }

    pub fn committer(&self) -> &str {
        &self.committer
    }
}

async fn watch(
    target: u64,
    start: Instant,
    baseline: u64,
    mut blocks: broadcast::Receiver<BlockEvent>,
) -> Result<ObserverReport> {
    let mut confirmed = 0;
    while confirmed < target {
        match blocks.recv().await {
            Ok(block) => {
                confirmed = block.total_txs - baseline;
                println!(
                    "Time {:>8.2}s\tBlock {:>6}\tTx {:>6}",
                    start.elapsed().as_secs_f64(),
                    block.number,
                    block.tx_count
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Commit observer fell behind the ledger");
            }
            Err(RecvError::Closed) => {
                return Err(CoreError::Observer("ledger stopped".to_string()));
            }
        }
    }

    Ok(ObserverReport {
        confirmed,
        elapsed: start.elapsed(),
    })
}

#[async_trait]
impl CommitObserver for SimCommitObserver {
    fn start(&self, target: u64, start: Instant) -> Result<()> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Done) {
            State::Idle { baseline, blocks } => {
                debug!(committer = %self.committer, target, "Watching for commits");
                *state = State::Watching(tokio::spawn(watch(target, start, baseline, blocks)));
                Ok(())
            }
            other => {
                *state = other;
                Err(CoreError::Observer("observer already started".to_string()))
            }
        }
    }

    async fn wait(&self) -> Result<ObserverReport> {
        let previous = std::mem::replace(&mut *self.state.lock(), State::Done);
        let handle = match previous {
            State::Watching(handle) => handle,
            State::Idle { .. } => {
                return Err(CoreError::Observer("observer not started".to_string()))
            }
            State::Done => return Err(CoreError::Observer("observer already awaited".to_string())),
        };

        handle
            .await
            .map_err(|e| CoreError::Observer(format!("observer task failed: {}", e)))?
    }
}

impl Drop for SimCommitObserver {
    fn drop(&mut self) {
        if let State::Watching(handle) = &*self.state.lock() {
            handle.abort();
        }
    }
}
