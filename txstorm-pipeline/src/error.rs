//! Pipeline error types

use thiserror::Error;
use txstorm_config::ConfigError;
use txstorm_core::CoreError;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that end a pipeline run.
///
/// Failures of individual records never show up here; they are logged and
/// counted where they happen.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Settings that cannot drive a run
    #[error("Invalid pipeline settings: {0}")]
    Settings(String),

    /// A CA bundle named in the configuration could not be loaded
    #[error("Certificate error: {0}")]
    Certificate(#[from] ConfigError),

    /// A required connection could not be established at startup
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: CoreError,
    },

    /// The commit observer failed to start or to complete
    #[error("Commit observer failed: {0}")]
    Observer(#[source] CoreError),

    /// A fatal condition aborted the run
    #[error("Fatal pipeline error: {0}")]
    Fatal(String),

    /// `run` was called again on an orchestrator that already ran
    #[error("Orchestrator has already been run")]
    AlreadyRun,

    /// Shutdown was requested before the target was confirmed
    #[error("Run interrupted before {target} transactions were confirmed")]
    Interrupted { target: u64 },
}
