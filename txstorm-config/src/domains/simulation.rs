//! Simulated network configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use txstorm_core::AckStatus;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_ratio, Validatable};

/// Behaviour of the in-process endorsers, orderer and ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay before an endorser answers
    #[serde(
        rename = "endorse_latency_ms",
        with = "crate::domains::utils::serde_duration_millis"
    )]
    pub endorse_latency: Duration,

    /// Probability of a transport error on any endorsement call
    pub endorse_failure_rate: f64,

    /// Endorser addresses that fail every call
    pub failing_endorsers: Vec<String>,

    /// Delay before the orderer accepts an envelope
    #[serde(
        rename = "broadcast_latency_ms",
        with = "crate::domains::utils::serde_duration_millis"
    )]
    pub broadcast_latency: Duration,

    /// Maximum transactions per block
    pub block_size: usize,

    /// Cut a partial block after this long
    #[serde(
        rename = "block_timeout_ms",
        with = "crate::domains::utils::serde_duration_millis"
    )]
    pub block_timeout: Duration,

    /// Status returned on every broadcast acknowledgment
    pub ack_status: AckStatus,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            endorse_latency: Duration::ZERO,
            endorse_failure_rate: 0.0,
            failing_endorsers: Vec::new(),
            broadcast_latency: Duration::ZERO,
            block_size: 100,
            block_timeout: Duration::from_millis(200),
            ack_status: AckStatus::Success,
        }
    }
}

impl Validatable for SimulationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_ratio(
            self.endorse_failure_rate,
            "endorse_failure_rate",
            self.domain_name(),
        )?;
        validate_positive(self.block_size, "block_size", self.domain_name())?;
        validate_positive(
            self.block_timeout.as_millis(),
            "block_timeout_ms",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "network"
    }
}
