//! Pipeline sizing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use txstorm_resilience::RetryPolicy;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Worker pool sizes, channel capacities and reporting cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of signer workers and, separately, of integrator workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of every inter-stage channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Number of concurrent tasks feeding the raw channel
    #[serde(default = "default_generator_tasks")]
    pub generator_tasks: usize,

    /// Interval between console diagnostics
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_report_interval")]
    pub report_interval: Duration,

    /// How long to wait for workers to stop after shutdown
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_shutdown_grace")]
    pub shutdown_grace: Duration,

    /// Endorsement retry policy; a single attempt unless configured
    #[serde(default)]
    pub endorsement_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            generator_tasks: default_generator_tasks(),
            report_interval: default_report_interval(),
            shutdown_grace: default_shutdown_grace(),
            endorsement_retry: RetryPolicy::default(),
        }
    }
}

impl Validatable for PipelineConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.workers, "workers", self.domain_name())?;
        validate_positive(self.channel_capacity, "channel_capacity", self.domain_name())?;
        validate_positive(self.generator_tasks, "generator_tasks", self.domain_name())?;
        validate_positive(
            self.report_interval.as_secs(),
            "report_interval",
            self.domain_name(),
        )?;
        validate_positive(
            self.endorsement_retry.max_attempts,
            "endorsement_retry.max_attempts",
            self.domain_name(),
        )?;

        if self.endorsement_retry.initial_delay > self.endorsement_retry.max_delay {
            return Err(self.validation_error(
                "endorsement_retry.initial_delay cannot exceed endorsement_retry.max_delay",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "pipeline"
    }
}

// Default value functions
fn default_workers() -> usize {
    10
}

fn default_channel_capacity() -> usize {
    100
}

fn default_generator_tasks() -> usize {
    10
}

fn default_report_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(2)
}
