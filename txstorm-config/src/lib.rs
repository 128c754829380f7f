//! Domain-driven configuration management for txstorm
//!
//! This crate provides the YAML configuration model split by functional
//! domains, with validation, defaults, and environment variable overrides.

pub mod certs;
pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

// Re-export main types
pub use certs::load_tls_ca_cert;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    identity::IdentityConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    node::NodeConfig,
    pipeline::PipelineConfig,
    simulation::SimulationConfig,
    TxStormConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_millis};
