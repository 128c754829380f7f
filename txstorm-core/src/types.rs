//! Message types exchanged with endorsing peers and the ordering service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Serialized client identity attached to every proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Membership service provider the client belongs to
    pub msp_id: String,
    /// Identity bytes, normally the PEM encoded signing certificate
    pub id_bytes: Vec<u8>,
}

/// An unsigned request to invoke a chaincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub tx_id: String,
    pub channel: String,
    pub chaincode: String,
    pub version: String,
    pub args: Vec<String>,
    pub creator: Creator,
    pub nonce: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl Proposal {
    /// Canonical byte encoding; this is what gets signed
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Proposal bytes together with the client signature over them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A peer's signature over the simulated result of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Identity of the endorsing peer
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Response of one endorsing peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    /// Address of the peer that produced the response
    pub endorser: String,
    pub status: i32,
    pub message: String,
    /// Simulation result; identical across peers for a deterministic chaincode
    pub payload: Vec<u8>,
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    /// Statuses in `[200, 400)` count as an endorsement
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Signed payload handed to the ordering service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub tx_id: String,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Status carried by a broadcast acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    RequestEntityTooLarge,
    InternalServerError,
    ServiceUnavailable,
}

impl AckStatus {
    /// Numeric status code as used on the wire
    pub fn code(&self) -> u16 {
        match self {
            AckStatus::Success => 200,
            AckStatus::BadRequest => 400,
            AckStatus::Forbidden => 403,
            AckStatus::NotFound => 404,
            AckStatus::RequestEntityTooLarge => 413,
            AckStatus::InternalServerError => 500,
            AckStatus::ServiceUnavailable => 503,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AckStatus::Success)
    }
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AckStatus::Success => "SUCCESS",
            AckStatus::BadRequest => "BAD_REQUEST",
            AckStatus::Forbidden => "FORBIDDEN",
            AckStatus::NotFound => "NOT_FOUND",
            AckStatus::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            AckStatus::InternalServerError => "INTERNAL_SERVER_ERROR",
            AckStatus::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Acknowledgment read from the broadcast stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub status: AckStatus,
    pub info: String,
}

impl BroadcastAck {
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
            info: String::new(),
        }
    }
}
