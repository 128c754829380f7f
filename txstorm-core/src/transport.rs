//! Collaborator interfaces
//!
//! The pipeline talks to endorsing peers, the ordering service and the
//! ledger only through these traits, so that different network backends can
//! be plugged in without touching the worker pools.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::types::{BroadcastAck, Envelope, ProposalResponse, SignedProposal};

/// A connection to one endorsing peer
#[async_trait]
pub trait Endorser: Send + Sync {
    /// Submit a signed proposal for endorsement
    async fn process_proposal(&self, signed: &SignedProposal) -> Result<ProposalResponse>;

    /// Address of the peer this connection points at
    fn address(&self) -> &str;
}

/// Sending half of a broadcast stream to the ordering service
#[async_trait]
pub trait BroadcastSender: Send {
    async fn send(&mut self, envelope: &Envelope) -> Result<()>;
}

/// Acknowledgment half of a broadcast stream
#[async_trait]
pub trait AckReceiver: Send {
    /// Next acknowledgment; `Ok(None)` marks a clean end of stream
    async fn recv(&mut self) -> Result<Option<BroadcastAck>>;
}

/// Both halves of one bidirectional broadcast stream
pub struct OrdererStream {
    pub sender: Box<dyn BroadcastSender>,
    pub acks: Box<dyn AckReceiver>,
}

/// Factory for secured client connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a dedicated connection to an endorsing peer
    async fn connect_endorser(&self, addr: &str, tls_ca_cert: &[u8]) -> Result<Box<dyn Endorser>>;

    /// Open a dedicated broadcast stream to the ordering service
    async fn connect_orderer(&self, addr: &str, tls_ca_cert: &[u8]) -> Result<OrdererStream>;
}

/// Outcome reported by a commit observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverReport {
    /// Transactions seen committed
    pub confirmed: u64,
    /// Time between `start` and reaching the target
    pub elapsed: Duration,
}

/// Watches the ledger for committed transactions
#[async_trait]
pub trait CommitObserver: Send + Sync {
    /// Begin counting committed transactions towards `target`
    fn start(&self, target: u64, start: Instant) -> Result<()>;

    /// Resolve once `target` committed transactions have been observed
    async fn wait(&self) -> Result<ObserverReport>;
}
