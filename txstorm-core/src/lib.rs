//! Core domain models and types for txstorm
//!
//! This crate contains the transaction record that flows through the
//! submission pipeline, the wire-level message types exchanged with
//! endorsing peers and the ordering service, the signing identity, and the
//! interfaces of every external collaborator the pipeline talks to.

pub mod error;
pub mod identity;
pub mod proposal;
pub mod record;
pub mod transport;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, Result};
pub use identity::{Ed25519Identity, Identity};
pub use proposal::create_proposal;
pub use record::{QuorumProgress, SharedRecord, TxRecord};
pub use transport::{
    AckReceiver, BroadcastSender, CommitObserver, Connector, Endorser, ObserverReport,
    OrdererStream,
};
pub use types::{
    AckStatus, BroadcastAck, Creator, Endorsement, Envelope, Proposal, ProposalResponse,
    SignedProposal,
};
