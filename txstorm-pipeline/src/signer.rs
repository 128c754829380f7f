//! Signer pool: signs raw proposals and fans them out to every endorser lane

use async_channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::{error, trace, warn};
use txstorm_core::{Identity, SharedRecord};
use txstorm_resilience::ShutdownSignal;

use crate::pool::{recv_or_shutdown, send_or_shutdown, WorkerPool};
use crate::stats::PipelineStats;

pub struct SignerPool {
    identity: Arc<dyn Identity>,
    stats: Arc<PipelineStats>,
}

impl SignerPool {
    pub fn new(identity: Arc<dyn Identity>, stats: Arc<PipelineStats>) -> Self {
        Self { identity, stats }
    }

    /// Spawn `size` signer workers reading `raw` and publishing to every
    /// sender in `signed`
    pub fn start(
        &self,
        pool: &mut WorkerPool,
        size: usize,
        raw: Receiver<SharedRecord>,
        signed: Vec<Sender<SharedRecord>>,
    ) {
        let signal = pool.signal();
        pool.spawn("signer", size, |_| {
            run_signer(
                self.identity.clone(),
                raw.clone(),
                signed.clone(),
                self.stats.clone(),
                signal.clone(),
            )
        });
    }
}

async fn run_signer(
    identity: Arc<dyn Identity>,
    raw: Receiver<SharedRecord>,
    signed: Vec<Sender<SharedRecord>>,
    stats: Arc<PipelineStats>,
    signal: ShutdownSignal,
) {
    while let Some(record) = recv_or_shutdown(&raw, &signal).await {
        let signed_proposal = match identity.sign_proposal(record.proposal()) {
            Ok(signed_proposal) => signed_proposal,
            Err(e) => {
                stats.record_sign_failed();
                error!(tx_id = %record.tx_id(), error = %e, "Failed to sign proposal, dropping record");
                continue;
            }
        };

        if let Err(e) = record.set_signed(signed_proposal) {
            stats.record_sign_failed();
            warn!(tx_id = %record.tx_id(), error = %e, "Record signed twice, dropping");
            continue;
        }
        stats.record_signed();
        trace!(tx_id = %record.tx_id(), "Signed proposal");

        for lane in &signed {
            if !send_or_shutdown(lane, record.clone(), &signal).await {
                return;
            }
        }
    }
}
