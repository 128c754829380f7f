//! Run settings derived from the loaded configuration

use std::time::Duration;
use txstorm_config::{NodeConfig, TxStormConfig};
use txstorm_resilience::RetryPolicy;

use crate::error::{PipelineError, PipelineResult};

/// A remote node with its CA bundle already loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: String,
    /// PEM CA bundle; empty for plaintext
    pub tls_ca_cert: Vec<u8>,
}

impl Endpoint {
    pub fn plaintext(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tls_ca_cert: Vec::new(),
        }
    }

    fn load(node: &NodeConfig) -> PipelineResult<Self> {
        Ok(Self {
            addr: node.addr.clone(),
            tls_ca_cert: node.load_ca_cert()?,
        })
    }
}

/// What every generated proposal invokes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTemplate {
    pub channel: String,
    pub chaincode: String,
    pub version: String,
    pub args: Vec<String>,
}

/// Everything a pipeline run needs besides its collaborators
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub proposal: ProposalTemplate,
    pub endorsers: Vec<Endpoint>,
    pub orderer: Endpoint,
    /// Connections per endorser, and to the orderer
    pub num_of_conn: usize,
    /// Signer workers, and separately integrator workers
    pub workers: usize,
    pub channel_capacity: usize,
    pub generator_tasks: usize,
    pub report_interval: Duration,
    pub shutdown_grace: Duration,
    pub endorsement_retry: RetryPolicy,
}

impl PipelineSettings {
    /// Build settings from configuration, loading every CA bundle
    pub fn from_config(config: &TxStormConfig) -> PipelineResult<Self> {
        let endorsers = config
            .endorsers
            .iter()
            .map(Endpoint::load)
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Self {
            proposal: ProposalTemplate {
                channel: config.channel.clone(),
                chaincode: config.chaincode.clone(),
                version: config.version.clone(),
                args: config.args.clone(),
            },
            endorsers,
            orderer: Endpoint::load(&config.orderer)?,
            num_of_conn: config.num_of_conn,
            workers: config.pipeline.workers,
            channel_capacity: config.pipeline.channel_capacity,
            generator_tasks: config.pipeline.generator_tasks,
            report_interval: config.pipeline.report_interval,
            shutdown_grace: config.pipeline.shutdown_grace,
            endorsement_retry: config.pipeline.endorsement_retry.clone(),
        })
    }

    /// Override the signer and integrator pool size
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Responses needed before a record is integrated
    pub fn quorum_threshold(&self) -> usize {
        self.endorsers.len()
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let positive = [
            ("endorsers", self.endorsers.len()),
            ("num_of_conn", self.num_of_conn),
            ("workers", self.workers),
            ("channel_capacity", self.channel_capacity),
            ("generator_tasks", self.generator_tasks),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(PipelineError::Settings(format!("{} must be positive", name)));
            }
        }

        if self.report_interval.is_zero() {
            return Err(PipelineError::Settings(
                "report_interval must be positive".to_string(),
            ));
        }
        if self.endorsement_retry.max_attempts == 0 {
            return Err(PipelineError::Settings(
                "endorsement_retry.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
