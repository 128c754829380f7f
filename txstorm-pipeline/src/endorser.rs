//! Endorsement pool
//!
//! One lane per (endorser, connection). Every lane of an endorser reads the
//! same signed channel, so each record is endorsed once per endorser. The
//! lane that appends the response completing the quorum forwards the record;
//! the decision is made under the record's lock by
//! [`TxRecord::add_response`](txstorm_core::TxRecord::add_response).

use async_channel::{Receiver, Sender};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use txstorm_core::{
    Connector, CoreError, Endorser, ProposalResponse, QuorumProgress, SharedRecord,
    SignedProposal,
};
use txstorm_resilience::{RetryExecutor, RetryPolicy, Retryable, ShutdownSignal};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::{recv_or_shutdown, send_or_shutdown, WorkerPool};
use crate::settings::Endpoint;
use crate::stats::PipelineStats;

/// Why a single endorsement attempt did not produce an endorsement
#[derive(Debug)]
pub enum EndorseFailure {
    Transport(CoreError),
    Rejected { status: i32, message: String },
}

impl fmt::Display for EndorseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndorseFailure::Transport(e) => write!(f, "{}, status: unknown", e),
            EndorseFailure::Rejected { status, message } => {
                write!(f, "{}, status: {}", message, status)
            }
        }
    }
}

impl Retryable for EndorseFailure {
    fn is_retryable(&self) -> bool {
        true
    }
}

async fn endorse_once(
    endorser: &dyn Endorser,
    signed: &SignedProposal,
) -> Result<ProposalResponse, EndorseFailure> {
    let response = endorser
        .process_proposal(signed)
        .await
        .map_err(EndorseFailure::Transport)?;

    if response.is_success() {
        Ok(response)
    } else {
        Err(EndorseFailure::Rejected {
            status: response.status,
            message: response.message,
        })
    }
}

/// Connections to every endorser, `num_of_conn` per endorser
pub struct ProposerPool {
    lanes: Vec<Vec<Box<dyn Endorser>>>,
}

impl ProposerPool {
    /// Open every connection; the first failure aborts startup
    pub async fn connect(
        connector: &dyn Connector,
        endorsers: &[Endpoint],
        num_of_conn: usize,
    ) -> PipelineResult<Self> {
        let mut lanes = Vec::with_capacity(endorsers.len());
        for endpoint in endorsers {
            let mut row = Vec::with_capacity(num_of_conn);
            for _ in 0..num_of_conn {
                let endorser = connector
                    .connect_endorser(&endpoint.addr, &endpoint.tls_ca_cert)
                    .await
                    .map_err(|source| PipelineError::Connect {
                        addr: endpoint.addr.clone(),
                        source,
                    })?;
                row.push(endorser);
            }
            lanes.push(row);
        }

        debug!(
            endorsers = endorsers.len(),
            num_of_conn, "Connected to endorsers"
        );
        Ok(Self { lanes })
    }

    /// Number of endorsers, which is also the quorum threshold
    pub fn endorsers(&self) -> usize {
        self.lanes.len()
    }

    /// Spawn one lane per connection.
    ///
    /// `signed[i]` feeds every connection of endorser `i`.
    pub fn start(
        self,
        pool: &mut WorkerPool,
        signed: &[Receiver<SharedRecord>],
        processed: Sender<SharedRecord>,
        threshold: usize,
        retry: RetryPolicy,
        stats: Arc<PipelineStats>,
    ) {
        info!("Start sending transactions");
        let signal = pool.signal();
        let retry = Arc::new(RetryExecutor::new(retry));

        for (row, input) in self.lanes.into_iter().zip(signed) {
            for (conn, endorser) in row.into_iter().enumerate() {
                pool.spawn_task(
                    "proposer",
                    conn,
                    run_lane(
                        endorser,
                        input.clone(),
                        processed.clone(),
                        threshold,
                        retry.clone(),
                        stats.clone(),
                        signal.clone(),
                    ),
                );
            }
        }
    }
}

async fn run_lane(
    connection: Box<dyn Endorser>,
    input: Receiver<SharedRecord>,
    processed: Sender<SharedRecord>,
    threshold: usize,
    retry: Arc<RetryExecutor>,
    stats: Arc<PipelineStats>,
    signal: ShutdownSignal,
) {
    let endorser: &dyn Endorser = connection.as_ref();
    let addr = endorser.address().to_string();

    while let Some(record) = recv_or_shutdown(&input, &signal).await {
        let Some(signed) = record.signed() else {
            error!(tx_id = %record.tx_id(), addr = %addr, "Unsigned record on endorsement lane");
            continue;
        };
        stats.record_endorse_attempt();

        let outcome = tokio::select! {
            biased;
            _ = signal.triggered() => break,
            outcome = retry.execute(move || endorse_once(endorser, signed)) => outcome,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                stats.record_endorse_failed();
                error!(
                    tx_id = %record.tx_id(),
                    addr = %addr,
                    "Err processing proposal: {}",
                    e.into_inner()
                );
                continue;
            }
        };

        match record.add_response(response, threshold) {
            QuorumProgress::Reached => {
                stats.record_quorum_reached();
                trace!(tx_id = %record.tx_id(), "Quorum reached");
                if !send_or_shutdown(&processed, record, &signal).await {
                    break;
                }
            }
            QuorumProgress::Pending(count) => {
                trace!(tx_id = %record.tx_id(), count, threshold, "Collected endorsement");
            }
            QuorumProgress::Surplus(count) => {
                warn!(tx_id = %record.tx_id(), count, threshold, "Endorsement beyond quorum");
            }
        }
    }
}
