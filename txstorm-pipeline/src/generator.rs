//! Load generation onto the raw channel

use async_channel::Sender;
use std::sync::Arc;
use tracing::debug;
use txstorm_core::{create_proposal, Identity, SharedRecord, TxRecord};
use txstorm_resilience::ShutdownCoordinator;

use crate::pool::send_or_shutdown;
use crate::settings::ProposalTemplate;
use crate::stats::PipelineStats;

/// Split `count` records over `tasks` generators; the first
/// `count % tasks` generators take one extra record.
pub fn split_quota(count: u64, tasks: usize) -> Vec<u64> {
    if tasks == 0 {
        return Vec::new();
    }
    let tasks_u64 = tasks as u64;
    let base = count / tasks_u64;
    let extra = count % tasks_u64;
    (0..tasks_u64)
        .map(|i| base + u64::from(i < extra))
        .collect()
}

/// Create `quota` proposals and enqueue them on `raw`.
///
/// A proposal that cannot be built aborts the run.
pub(crate) async fn run_generator(
    quota: u64,
    template: Arc<ProposalTemplate>,
    identity: Arc<dyn Identity>,
    raw: Sender<SharedRecord>,
    stats: Arc<PipelineStats>,
    coordinator: ShutdownCoordinator,
) {
    let signal = coordinator.signal();

    for _ in 0..quota {
        let proposal = match create_proposal(
            identity.as_ref(),
            &template.channel,
            &template.chaincode,
            &template.version,
            &template.args,
        ) {
            Ok(proposal) => proposal,
            Err(e) => {
                coordinator.abort(format!("failed to create proposal: {}", e));
                return;
            }
        };

        if !send_or_shutdown(&raw, TxRecord::shared(proposal), &signal).await {
            return;
        }
        stats.record_generated();
    }
    debug!(quota, "Generator finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use proptest::prelude::*;

    #[test]
    fn test_split_quota_remainder_goes_first() {
        assert_eq!(split_quota(25, 10), vec![3, 3, 3, 3, 3, 2, 2, 2, 2, 2]);
        assert_eq!(split_quota(3, 10), vec![1, 1, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(split_quota(0, 2), vec![0, 0]);
        assert!(split_quota(5, 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_quota_sums_to_count(count in 0u64..100_000, tasks in 1usize..64) {
            let quotas = split_quota(count, tasks);
            prop_assert_eq!(quotas.len(), tasks);
            prop_assert_eq!(quotas.iter().sum::<u64>(), count);
            let max = *quotas.iter().max().unwrap();
            let min = *quotas.iter().min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }

    #[tokio::test]
    async fn test_generator_enqueues_quota() {
        let (tx, rx) = async_channel::bounded(16);
        let stats = Arc::new(PipelineStats::new());
        let template = Arc::new(ProposalTemplate {
            channel: "mychannel".to_string(),
            chaincode: "basic".to_string(),
            version: "1.0".to_string(),
            args: vec!["CreateAsset".to_string()],
        });

        run_generator(
            7,
            template,
            test_support::identity(),
            tx,
            stats.clone(),
            ShutdownCoordinator::new(),
        )
        .await;

        assert_eq!(rx.len(), 7);
        assert_eq!(stats.snapshot().generated, 7);
        let record = rx.try_recv().unwrap();
        assert_eq!(record.proposal().chaincode, "basic");
        assert!(record.signed().is_none());
    }
}
