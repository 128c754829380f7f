//! Core error types for txstorm

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the record, the identity and the transport collaborators
#[derive(Debug, Error)]
pub enum CoreError {
    /// Producing a signature failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Loading key or certificate material failed
    #[error("Identity error: {0}")]
    Identity(String),

    /// The endorsement set cannot be assembled into an envelope
    #[error("Envelope assembly failed: {0}")]
    Envelope(String),

    /// A write-once field of a transaction record was written twice
    #[error("Record field already set: {0}")]
    AlreadySet(&'static str),

    /// Connection could not be established
    #[error("Failed to connect to {addr}: {reason}")]
    Connection { addr: String, reason: String },

    /// Transport failure on an established connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// The stream to a remote service was closed
    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// Commit observer failure
    #[error("Commit observer error: {0}")]
    Observer(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
