//! Staged transaction submission pipeline
//!
//! ```text
//! generator -> raw -> signers -> signed[e] -> endorsement lanes -> processed
//!           -> integrators -> envs -> broadcasters -> ordering service
//! ```
//!
//! Every stage is a pool of tokio tasks connected by bounded channels, so a
//! stalled stage throttles everything upstream of it. All tasks share one
//! [`ShutdownCoordinator`](txstorm_resilience::ShutdownCoordinator) and stop
//! at their next channel operation once it fires.

pub mod broadcaster;
pub mod channels;
pub mod endorser;
pub mod error;
pub mod generator;
pub mod integrator;
pub mod orchestrator;
pub mod pool;
pub mod reporter;
pub mod settings;
pub mod signer;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use broadcaster::BroadcasterPool;
pub use channels::{ChannelDepths, Lane, PipelineChannels};
pub use endorser::{EndorseFailure, ProposerPool};
pub use error::{PipelineError, PipelineResult};
pub use generator::split_quota;
pub use integrator::IntegratorPool;
pub use orchestrator::{Orchestrator, RunSummary};
pub use pool::{recv_or_shutdown, send_or_shutdown, WorkerPool};
pub use reporter::Reporter;
pub use settings::{Endpoint, PipelineSettings, ProposalTemplate};
pub use signer::SignerPool;
pub use stats::{PipelineStats, StatsSnapshot};
