//! Simulated endorsing peer

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use txstorm_core::{
    CoreError, Endorsement, Proposal, ProposalResponse, Result, SignedProposal,
};

const SIGNATURE_LEN: usize = 64;

/// Behaviour shared by every connection to one endorser
#[derive(Debug, Clone)]
pub struct EndorserProfile {
    pub latency: Duration,
    pub failure_rate: f64,
    /// Fail every call
    pub unavailable: bool,
}

/// One connection to a simulated peer
pub struct SimEndorser {
    addr: String,
    key: Arc<SigningKey>,
    profile: EndorserProfile,
}

impl SimEndorser {
    pub fn new(addr: impl Into<String>, profile: EndorserProfile) -> Self {
        let addr = addr.into();
        let key = Arc::new(peer_key(&addr));
        Self { addr, key, profile }
    }

    /// Public key the peer endorses with
    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    fn respond(&self, status: i32, message: &str) -> ProposalResponse {
        ProposalResponse {
            endorser: self.addr.clone(),
            status,
            message: message.to_string(),
            payload: Vec::new(),
            endorsement: None,
        }
    }
}

/// Every peer derives its key from its address, so connections to the same
/// peer endorse with the same identity
pub fn peer_key(addr: &str) -> SigningKey {
    let seed: [u8; 32] = Sha256::digest(addr.as_bytes()).into();
    SigningKey::from_bytes(&seed)
}

#[async_trait]
impl txstorm_core::Endorser for SimEndorser {
    async fn process_proposal(&self, signed: &SignedProposal) -> Result<ProposalResponse> {
        if !self.profile.latency.is_zero() {
            tokio::time::sleep(self.profile.latency).await;
        }

        if self.profile.unavailable {
            return Err(CoreError::Transport(format!(
                "endorser {} unavailable",
                self.addr
            )));
        }
        if self.profile.failure_rate > 0.0 && rand::rng().random_bool(self.profile.failure_rate) {
            return Err(CoreError::Transport(format!(
                "endorser {} dropped the request",
                self.addr
            )));
        }

        if signed.signature.len() != SIGNATURE_LEN {
            return Ok(self.respond(400, "malformed proposal signature"));
        }
        if serde_json::from_slice::<Proposal>(&signed.proposal_bytes).is_err() {
            return Ok(self.respond(400, "malformed proposal"));
        }

        // Deterministic chaincode: every peer computes the same result
        let payload = Sha256::digest(&signed.proposal_bytes).to_vec();
        let signature = self.key.sign(&payload).to_bytes().to_vec();

        Ok(ProposalResponse {
            endorser: self.addr.clone(),
            status: 200,
            message: "OK".to_string(),
            endorsement: Some(Endorsement {
                endorser: self.public_key().to_vec(),
                signature,
            }),
            payload,
        })
    }

    fn address(&self) -> &str {
        &self.addr
    }
}
