//! The `run` command

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use txstorm_config::TxStormConfig;
use txstorm_core::Ed25519Identity;
use txstorm_pipeline::{Orchestrator, PipelineSettings, RunSummary};
use txstorm_resilience::ShutdownCoordinator;
use txstorm_sim::SimNetwork;

/// Drive `count` transactions through the simulated network
pub async fn handle_run(
    config: &TxStormConfig,
    count: u64,
    workers: Option<usize>,
) -> Result<RunSummary> {
    let identity = Ed25519Identity::load(
        config.identity.msp_id.clone(),
        config.identity.private_key.as_deref(),
        config.identity.sign_cert.as_deref(),
    )
    .context("Failed to load client identity")?;

    let mut settings =
        PipelineSettings::from_config(config).context("Failed to prepare pipeline settings")?;
    if let Some(workers) = workers {
        settings = settings.with_workers(workers);
    }

    let network = SimNetwork::new(config.network.clone());
    let observer = network.observer(&config.committer.addr);
    let orchestrator = Orchestrator::new(
        settings,
        Arc::new(identity),
        Arc::new(network),
        Arc::new(observer),
    );

    let interrupt = tokio::spawn(forward_ctrl_c(orchestrator.shutdown_handle()));

    info!(
        count,
        endorsers = config.endorsers.len(),
        num_of_conn = config.num_of_conn,
        workers = orchestrator.settings().workers,
        "Starting run"
    );
    let result = orchestrator.run(count).await;
    interrupt.abort();

    let summary = result.context("Run failed")?;
    info!(confirmed = summary.confirmed, "Run finished");
    Ok(summary)
}

async fn forward_ctrl_c(shutdown: ShutdownCoordinator) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Interrupted, shutting down");
            shutdown.shutdown();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
