//! Resilience patterns for txstorm
//!
//! Retry policies with configurable backoff, and the shutdown coordinator
//! shared by every task of a pipeline run.

pub mod backoff;
pub mod retry;
pub mod shutdown;

pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
pub use shutdown::{ShutdownCoordinator, ShutdownError, ShutdownSignal, TaskGuard};
