//! Domain-specific configuration modules

pub mod identity;
pub mod logging;
pub mod node;
pub mod pipeline;
pub mod simulation;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{
    validate_enum_choice, validate_positive, validate_required_string, Validatable,
};

/// Main txstorm configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxStormConfig {
    /// Channel the transactions are submitted on
    pub channel: String,

    /// Chaincode to invoke
    pub chaincode: String,

    /// Chaincode version
    #[serde(default)]
    pub version: String,

    /// Invocation arguments, the function name first
    #[serde(default)]
    pub args: Vec<String>,

    /// Connections per endorser and to the orderer
    #[serde(default = "default_num_of_conn")]
    pub num_of_conn: usize,

    /// Endorsing peers; every one of them must endorse each transaction
    pub endorsers: Vec<node::NodeConfig>,

    /// Ordering service endpoint
    pub orderer: node::NodeConfig,

    /// Peer whose ledger is watched for commits
    pub committer: node::NodeConfig,

    /// Client signing identity
    #[serde(default)]
    pub identity: identity::IdentityConfig,

    /// Worker pool and channel sizing
    #[serde(default)]
    pub pipeline: pipeline::PipelineConfig,

    /// Simulated network behaviour
    #[serde(default)]
    pub network: simulation::SimulationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl TxStormConfig {
    /// Number of endorsements needed before a transaction is broadcast
    pub fn quorum_threshold(&self) -> usize {
        self.endorsers.len()
    }

    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        validate_required_string(&self.channel, "channel", "root")?;
        validate_required_string(&self.chaincode, "chaincode", "root")?;
        validate_positive(self.num_of_conn, "num_of_conn", "root")?;

        if self.endorsers.is_empty() {
            return Err(ConfigError::DomainError {
                domain: "endorsers".to_string(),
                message: "at least one endorser must be configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for endorser in &self.endorsers {
            endorser.validate()?;
            if !seen.insert(endorser.addr.as_str()) {
                return Err(ConfigError::DomainError {
                    domain: "endorsers".to_string(),
                    message: format!("duplicate endorser address {}", endorser.addr),
                });
            }
        }

        self.orderer.validate()?;
        self.committer.validate()?;
        self.identity.validate()?;
        self.pipeline.validate()?;
        self.network.validate()?;
        self.logging.validate()?;

        let addrs: Vec<&str> = self.endorsers.iter().map(|e| e.addr.as_str()).collect();
        for failing in &self.network.failing_endorsers {
            validate_enum_choice(failing, &addrs, "failing_endorsers", "network")?;
        }

        Ok(())
    }

    /// Make relative certificate and key paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for endorser in &mut self.endorsers {
            endorser.resolve_paths(base);
        }
        self.orderer.resolve_paths(base);
        self.committer.resolve_paths(base);
        self.identity.resolve_paths(base);
    }

    /// A small two-organisation network, used for `config generate`
    pub fn sample() -> Self {
        Self {
            channel: "mychannel".to_string(),
            chaincode: "basic".to_string(),
            version: "1.0".to_string(),
            args: vec![
                "CreateAsset".to_string(),
                "asset1".to_string(),
                "blue".to_string(),
                "5".to_string(),
                "tom".to_string(),
                "100".to_string(),
            ],
            num_of_conn: default_num_of_conn(),
            endorsers: vec![
                node::NodeConfig::new("peer0.org1.example.com:7051"),
                node::NodeConfig::new("peer0.org2.example.com:9051"),
            ],
            orderer: node::NodeConfig::new("orderer.example.com:7050"),
            committer: node::NodeConfig::new("peer0.org1.example.com:7051"),
            identity: identity::IdentityConfig::default(),
            pipeline: pipeline::PipelineConfig::default(),
            network: simulation::SimulationConfig::default(),
            logging: logging::LoggingConfig::default(),
        }
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        serde_yaml::to_string(&Self::sample())
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

fn default_num_of_conn() -> usize {
    4
}
