//! Bounded channels throttle upstream stages when downstream stalls

mod common;

use anyhow::Result;
use async_channel::TrySendError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use txstorm_core::{create_proposal, Ed25519Identity, Identity, SharedRecord, TxRecord};
use txstorm_pipeline::{PipelineChannels, PipelineError, PipelineStats, SignerPool, WorkerPool};
use txstorm_resilience::ShutdownCoordinator;

fn record(identity: &dyn Identity) -> Result<SharedRecord> {
    let proposal = create_proposal(identity, "mychannel", "basic", "1.0", &[])?;
    Ok(TxRecord::shared(proposal))
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> Result<()> {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn test_stalled_lane_blocks_signer_and_fills_raw() -> Result<()> {
    let identity: Arc<dyn Identity> = Arc::new(Ed25519Identity::generate("Org1MSP"));
    let stats = Arc::new(PipelineStats::new());
    let channels = PipelineChannels::new(1, 1);
    let mut pool = WorkerPool::new(ShutdownCoordinator::new());

    SignerPool::new(identity.clone(), stats.clone()).start(
        &mut pool,
        1,
        channels.raw.rx.clone(),
        channels.signed_senders(),
    );

    // One record parked on the lane, one held by the blocked signer
    channels.raw.tx.send(record(identity.as_ref())?).await?;
    channels.raw.tx.send(record(identity.as_ref())?).await?;
    wait_until(|| stats.snapshot().signed == 2).await?;

    // The third fills raw and the fourth is refused
    channels.raw.tx.send(record(identity.as_ref())?).await?;
    assert!(matches!(
        channels.raw.tx.try_send(record(identity.as_ref())?),
        Err(TrySendError::Full(_))
    ));
    assert_eq!(channels.depths().signed, vec![1]);

    // Draining the lane lets everything move one step
    let first = channels.signed[0].rx.recv().await?;
    assert!(first.signed().is_some());
    wait_until(|| stats.snapshot().signed == 3).await?;
    assert!(channels.raw.is_empty());

    pool.coordinator().shutdown();
    pool.join_all(Duration::from_secs(1)).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_orderer_throttles_generation() -> Result<()> {
    let mut config = common::config(2);
    config.pipeline.channel_capacity = 2;
    config.network.broadcast_latency = Duration::from_secs(3600);
    let (orchestrator, network) = common::orchestrator(&config);

    let shutdown = orchestrator.shutdown_handle();
    let stats = orchestrator.stats();
    let interrupter = tokio::spawn(async move {
        // Wait for the first envelope to reach a broadcaster, then let the
        // pipeline fill up behind it
        while stats.snapshot().broadcast_attempts == 0 {
            sleep(Duration::from_millis(5)).await;
        }
        sleep(Duration::from_millis(300)).await;
        let generated = stats.snapshot().generated;
        shutdown.shutdown();
        generated
    });

    let result = timeout(Duration::from_secs(10), orchestrator.run(10_000)).await?;
    let generated = interrupter.await?;

    assert!(matches!(result, Err(PipelineError::Interrupted { target: 10_000 })));
    // Every channel and every worker holds a handful of records at most
    assert!(generated < 100, "generated {} records", generated);
    assert_eq!(network.ledger().total_txs(), 0);
    Ok(())
}
