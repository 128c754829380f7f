//! The transaction record threaded through every pipeline stage
//!
//! A record is created with only its proposal populated. The signer sets the
//! signed proposal once, the endorsement lanes append responses concurrently,
//! and the integrator sets the envelope once. Records travel between stages as
//! [`SharedRecord`] handles; during endorsement up to `threshold` lanes hold
//! the same record at the same time, and the response list is guarded by the
//! record's own lock.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::types::{Envelope, Proposal, ProposalResponse, SignedProposal};

/// Reference-counted handle to a record
pub type SharedRecord = Arc<TxRecord>;

/// Where a record stands after a response was appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumProgress {
    /// Fewer responses than the threshold
    Pending(usize),
    /// This append moved the count onto the threshold
    Reached,
    /// More responses than the threshold; quorum was reached earlier
    Surplus(usize),
}

/// Unit of work flowing through the pipeline
#[derive(Debug)]
pub struct TxRecord {
    proposal: Proposal,
    signed: OnceCell<SignedProposal>,
    responses: Mutex<Vec<ProposalResponse>>,
    envelope: OnceCell<Envelope>,
}

impl TxRecord {
    pub fn new(proposal: Proposal) -> Self {
        Self {
            proposal,
            signed: OnceCell::new(),
            responses: Mutex::new(Vec::new()),
            envelope: OnceCell::new(),
        }
    }

    /// Create a record already wrapped for sharing between stages
    pub fn shared(proposal: Proposal) -> SharedRecord {
        Arc::new(Self::new(proposal))
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    pub fn tx_id(&self) -> &str {
        &self.proposal.tx_id
    }

    /// Set the signed proposal; fails if it was already set
    pub fn set_signed(&self, signed: SignedProposal) -> Result<()> {
        self.signed
            .set(signed)
            .map_err(|_| CoreError::AlreadySet("signed_proposal"))
    }

    pub fn signed(&self) -> Option<&SignedProposal> {
        self.signed.get()
    }

    /// Append an endorsement response and classify the new count.
    ///
    /// The append and the threshold comparison happen under the same lock, so
    /// across any number of concurrent callers exactly one observes
    /// [`QuorumProgress::Reached`].
    pub fn add_response(&self, response: ProposalResponse, threshold: usize) -> QuorumProgress {
        let mut responses = self.responses.lock();
        responses.push(response);
        let count = responses.len();
        if count < threshold {
            QuorumProgress::Pending(count)
        } else if count == threshold {
            QuorumProgress::Reached
        } else {
            QuorumProgress::Surplus(count)
        }
    }

    pub fn response_count(&self) -> usize {
        self.responses.lock().len()
    }

    /// Snapshot of the responses collected so far
    pub fn responses(&self) -> Vec<ProposalResponse> {
        self.responses.lock().clone()
    }

    /// Set the envelope; fails if it was already set
    pub fn set_envelope(&self, envelope: Envelope) -> Result<()> {
        self.envelope
            .set(envelope)
            .map_err(|_| CoreError::AlreadySet("envelope"))
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.get()
    }
}
