//! Integrator pool: turns quorum-complete records into broadcast envelopes

use async_channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::{error, trace};
use txstorm_core::{Identity, SharedRecord};
use txstorm_resilience::ShutdownSignal;

use crate::pool::{recv_or_shutdown, send_or_shutdown, WorkerPool};
use crate::stats::PipelineStats;

pub struct IntegratorPool {
    identity: Arc<dyn Identity>,
    stats: Arc<PipelineStats>,
    threshold: usize,
}

impl IntegratorPool {
    pub fn new(identity: Arc<dyn Identity>, stats: Arc<PipelineStats>, threshold: usize) -> Self {
        Self {
            identity,
            stats,
            threshold,
        }
    }

    pub fn start(
        &self,
        pool: &mut WorkerPool,
        size: usize,
        processed: Receiver<SharedRecord>,
        envs: Sender<SharedRecord>,
    ) {
        let signal = pool.signal();
        pool.spawn("integrator", size, |_| {
            run_integrator(
                self.identity.clone(),
                self.threshold,
                processed.clone(),
                envs.clone(),
                self.stats.clone(),
                signal.clone(),
            )
        });
    }
}

async fn run_integrator(
    identity: Arc<dyn Identity>,
    threshold: usize,
    processed: Receiver<SharedRecord>,
    envs: Sender<SharedRecord>,
    stats: Arc<PipelineStats>,
    signal: ShutdownSignal,
) {
    while let Some(record) = recv_or_shutdown(&processed, &signal).await {
        let responses = record.responses();
        if responses.len() < threshold {
            stats.record_integrate_failed();
            error!(
                tx_id = %record.tx_id(),
                count = responses.len(),
                threshold,
                "Record reached integrator without quorum"
            );
            continue;
        }

        let Some(signed) = record.signed() else {
            stats.record_integrate_failed();
            error!(tx_id = %record.tx_id(), "Record reached integrator unsigned");
            continue;
        };

        let assembled = identity
            .build_envelope(signed, &responses)
            .and_then(|envelope| record.set_envelope(envelope));
        if let Err(e) = assembled {
            stats.record_integrate_failed();
            error!(tx_id = %record.tx_id(), error = %e, "Failed to assemble envelope");
            continue;
        }
        stats.record_integrated();
        trace!(tx_id = %record.tx_id(), "Envelope assembled");

        if !send_or_shutdown(&envs, record, &signal).await {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::PipelineChannels;
    use crate::test_support;
    use std::time::Duration;
    use txstorm_core::{Ed25519Identity, ProposalResponse, QuorumProgress};
    use txstorm_resilience::ShutdownCoordinator;

    struct Harness {
        channels: PipelineChannels,
        stats: Arc<PipelineStats>,
        shutdown: ShutdownCoordinator,
        pool: WorkerPool,
    }

    fn start(identity: Arc<dyn Identity>, threshold: usize) -> Harness {
        let channels = PipelineChannels::new(threshold, 8);
        let stats = Arc::new(PipelineStats::new());
        let shutdown = ShutdownCoordinator::new();
        let mut pool = WorkerPool::new(shutdown.clone());
        IntegratorPool::new(identity, stats.clone(), threshold).start(
            &mut pool,
            2,
            channels.processed.rx.clone(),
            channels.envs.tx.clone(),
        );
        Harness {
            channels,
            stats,
            shutdown,
            pool,
        }
    }

    #[tokio::test]
    async fn test_envelope_built_once_quorum_is_met() {
        let identity = test_support::identity();
        let h = start(identity.clone(), 3);

        let record = test_support::signed_record(identity.as_ref());
        for addr in ["peer0:7051", "peer1:7051", "peer2:7051"] {
            record.add_response(test_support::endorsed(addr), 3);
        }
        h.channels.processed.tx.send(record.clone()).await.unwrap();

        let out = h.channels.envs.rx.recv().await.unwrap();
        assert!(Arc::ptr_eq(&out, &record));
        let envelope = out.envelope().unwrap();
        assert_eq!(envelope.tx_id, record.tx_id());
        assert_eq!(h.stats.snapshot().integrated, 1);

        h.shutdown.shutdown();
        h.pool.join_all(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_short_of_quorum_is_rejected() {
        let identity = test_support::identity();
        let h = start(identity.clone(), 3);

        let record = test_support::signed_record(identity.as_ref());
        assert_eq!(
            record.add_response(test_support::endorsed("peer0:7051"), 3),
            QuorumProgress::Pending(1)
        );
        h.channels.processed.tx.send(record.clone()).await.unwrap();
        test_support::wait_until(|| h.stats.snapshot().integrate_failed == 1).await;

        assert!(record.envelope().is_none());
        assert!(h.channels.envs.is_empty());
        assert_eq!(h.stats.snapshot().integrate_failed, 1);

        h.shutdown.shutdown();
        h.pool.join_all(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_mismatched_payloads_are_rejected() {
        let identity: Arc<dyn Identity> =
            Arc::new(Ed25519Identity::from_seed("Org1MSP", [3u8; 32], None));
        let h = start(identity.clone(), 2);

        let record = test_support::signed_record(identity.as_ref());
        record.add_response(test_support::endorsed("peer0:7051"), 2);
        record.add_response(
            ProposalResponse {
                payload: b"something else".to_vec(),
                ..test_support::endorsed("peer1:7051")
            },
            2,
        );
        h.channels.processed.tx.send(record.clone()).await.unwrap();
        test_support::wait_until(|| h.stats.snapshot().integrate_failed == 1).await;

        assert!(record.envelope().is_none());
        assert_eq!(h.stats.snapshot().integrate_failed, 1);

        h.shutdown.shutdown();
        h.pool.join_all(Duration::from_secs(1)).await.unwrap();
    }
}
