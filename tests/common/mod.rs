//! Shared fixtures for the end-to-end scenarios

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use txstorm_config::{NodeConfig, TxStormConfig};
use txstorm_core::Ed25519Identity;
use txstorm_pipeline::{Orchestrator, PipelineSettings};
use txstorm_sim::SimNetwork;

/// A configuration with `endorsers` peers and quiet, fast settings
pub fn config(endorsers: usize) -> TxStormConfig {
    let mut config = TxStormConfig::sample();
    config.endorsers = (0..endorsers)
        .map(|n| NodeConfig::new(format!("peer0.org{}.example.com:7051", n + 1)))
        .collect();
    config.committer = config.endorsers[0].clone();
    config.num_of_conn = 2;
    config.pipeline.workers = 4;
    config.pipeline.channel_capacity = 16;
    config.pipeline.report_interval = Duration::from_secs(3600);
    config.pipeline.shutdown_grace = Duration::from_secs(2);
    config.network.block_size = 10;
    config.network.block_timeout = Duration::from_millis(20);
    config
}

/// An orchestrator wired to a fresh simulated network
pub fn orchestrator(config: &TxStormConfig) -> (Orchestrator, Arc<SimNetwork>) {
    let settings = PipelineSettings::from_config(config).expect("settings");
    let network = Arc::new(SimNetwork::new(config.network.clone()));
    let observer = network.observer(&config.committer.addr);
    let orchestrator = Orchestrator::new(
        settings,
        Arc::new(Ed25519Identity::generate(config.identity.msp_id.clone())),
        network.clone(),
        Arc::new(observer),
    );
    (orchestrator, network)
}
