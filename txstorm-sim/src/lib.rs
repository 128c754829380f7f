//! In-process simulation of a ledger network
//!
//! Endorsing peers, an ordering service that cuts blocks, and a ledger with
//! a commit observer, all behind the collaborator traits from
//! `txstorm-core`. Behaviour is driven by
//! [`SimulationConfig`](txstorm_config::SimulationConfig): latencies, failure
//! injection and the status the orderer acknowledges with.

pub mod endorser;
pub mod ledger;
pub mod network;
pub mod observer;
pub mod orderer;

pub use endorser::{peer_key, EndorserProfile, SimEndorser};
pub use ledger::{BlockEvent, Ledger};
pub use network::SimNetwork;
pub use observer::SimCommitObserver;
pub use orderer::{BlockCutter, SimAckReceiver, SimBroadcastSender};
