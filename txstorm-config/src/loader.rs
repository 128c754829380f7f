//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;

use crate::domains::logging::LogFormat;
use crate::domains::TxStormConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "TXSTORM".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides.
    ///
    /// Relative certificate and key paths are resolved against the directory
    /// holding the file.
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<TxStormConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: TxStormConfig = serde_yaml::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        tracing::debug!(
            path = %path.display(),
            endorsers = config.endorsers.len(),
            num_of_conn = config.num_of_conn,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a YAML string with environment overrides
    pub fn from_yaml(&self, content: &str) -> ConfigResult<TxStormConfig> {
        let mut config: TxStormConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut TxStormConfig) -> ConfigResult<()> {
        if let Ok(channel) = self.get_env_var("CHANNEL") {
            config.channel = channel;
        }

        if let Ok(chaincode) = self.get_env_var("CHAINCODE") {
            config.chaincode = chaincode;
        }

        if let Ok(conns) = self.get_env_var("NUM_OF_CONN") {
            config.num_of_conn = conns
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid NUM_OF_CONN: {}", e)))?;
        }

        self.apply_pipeline_overrides(&mut config.pipeline)?;
        self.apply_logging_overrides(&mut config.logging)?;

        Ok(())
    }

    /// Apply pipeline config overrides
    fn apply_pipeline_overrides(
        &self,
        config: &mut crate::domains::pipeline::PipelineConfig,
    ) -> ConfigResult<()> {
        if let Ok(workers) = self.get_env_var("WORKERS") {
            config.workers = workers
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid WORKERS: {}", e)))?;
        }

        if let Ok(capacity) = self.get_env_var("CHANNEL_CAPACITY") {
            config.channel_capacity = capacity.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid CHANNEL_CAPACITY: {}", e))
            })?;
        }

        Ok(())
    }

    /// Apply logging config overrides.
    ///
    /// The level is left alone; `TXSTORM_LOGLEVEL` is read when logging is
    /// initialized.
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
