//! Logging setup for txstorm
//!
//! Installs a `tracing-subscriber` fmt subscriber. Pipeline diagnostics go to
//! stdout; log lines go to stderr so the two never interleave mid-line.

pub mod init;

pub use init::{init_logging, init_tracing, resolve_level, LOG_LEVEL_ENV};
