//! Client signing identity
//!
//! The pipeline only needs two things from the client's cryptographic
//! material: a signature over arbitrary bytes and the assembly of a signed
//! envelope from a signed proposal and its endorsements. Both live behind the
//! [`Identity`] trait so the pipeline never touches key material directly.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::types::{Creator, Endorsement, Envelope, Proposal, ProposalResponse, SignedProposal};

/// Signing identity of the load-generating client
pub trait Identity: Send + Sync {
    /// Serialized identity attached to proposals
    fn creator(&self) -> &Creator;

    /// Sign arbitrary bytes
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Sign the canonical encoding of a proposal
    fn sign_proposal(&self, proposal: &Proposal) -> Result<SignedProposal> {
        let proposal_bytes = proposal.bytes()?;
        let signature = self.sign(&proposal_bytes)?;
        Ok(SignedProposal {
            proposal_bytes,
            signature,
        })
    }

    /// Assemble and sign the broadcast envelope for an endorsed proposal.
    ///
    /// Every response must be successful and carry the same payload.
    fn build_envelope(
        &self,
        signed: &SignedProposal,
        responses: &[ProposalResponse],
    ) -> Result<Envelope> {
        let first = responses
            .first()
            .ok_or_else(|| CoreError::Envelope("at least one proposal response is required".to_string()))?;

        let mut endorsements = Vec::with_capacity(responses.len());
        for response in responses {
            if !response.is_success() {
                return Err(CoreError::Envelope(format!(
                    "proposal response from {} was not successful, status {}",
                    response.endorser, response.status
                )));
            }
            if response.payload != first.payload {
                return Err(CoreError::Envelope(
                    "proposal response payloads do not match".to_string(),
                ));
            }
            if let Some(endorsement) = &response.endorsement {
                endorsements.push(endorsement.clone());
            }
        }

        let proposal: Proposal = serde_json::from_slice(&signed.proposal_bytes)?;
        let payload = EnvelopePayload {
            tx_id: proposal.tx_id.clone(),
            channel: proposal.channel,
            creator: self.creator().clone(),
            proposal_hash: hex::encode(Sha256::digest(&signed.proposal_bytes)),
            response_payload: first.payload.clone(),
            endorsements,
        };
        let payload = serde_json::to_vec(&payload)?;
        let signature = self.sign(&payload)?;

        Ok(Envelope {
            tx_id: proposal.tx_id,
            payload,
            signature,
        })
    }
}

/// Body of a transaction envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopePayload {
    pub tx_id: String,
    pub channel: String,
    pub creator: Creator,
    pub proposal_hash: String,
    pub response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

/// Ed25519 identity loaded from a hex seed file
pub struct Ed25519Identity {
    creator: Creator,
    key: SigningKey,
}

impl Ed25519Identity {
    pub fn from_seed(msp_id: impl Into<String>, seed: [u8; 32], id_bytes: Option<Vec<u8>>) -> Self {
        let key = SigningKey::from_bytes(&seed);
        let id_bytes =
            id_bytes.unwrap_or_else(|| hex::encode(key.verifying_key().as_bytes()).into_bytes());
        Self {
            creator: Creator {
                msp_id: msp_id.into(),
                id_bytes,
            },
            key,
        }
    }

    /// Generate an ephemeral identity
    pub fn generate(msp_id: impl Into<String>) -> Self {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        Self::from_seed(msp_id, seed, None)
    }

    /// Load an identity from disk.
    ///
    /// `private_key` holds a hex encoded 32-byte seed; without it an ephemeral
    /// key is generated. `sign_cert` is read verbatim as the creator identity
    /// bytes; without it the hex public key is used.
    pub fn load(
        msp_id: impl Into<String>,
        private_key: Option<&Path>,
        sign_cert: Option<&Path>,
    ) -> Result<Self> {
        let msp_id = msp_id.into();
        let id_bytes = match sign_cert {
            Some(path) => Some(std::fs::read(path).map_err(|e| {
                CoreError::Identity(format!("failed to read sign cert {}: {}", path.display(), e))
            })?),
            None => None,
        };

        match private_key {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    CoreError::Identity(format!("failed to read private key {}: {}", path.display(), e))
                })?;
                let seed = decode_seed(contents.trim())?;
                Ok(Self::from_seed(msp_id, seed, id_bytes))
            }
            None => {
                tracing::warn!(%msp_id, "No private key configured, using an ephemeral identity");
                let mut identity = Self::generate(msp_id);
                if let Some(id_bytes) = id_bytes {
                    identity.creator.id_bytes = id_bytes;
                }
                Ok(identity)
            }
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Verify a signature against a raw ed25519 public key
    pub fn verify(public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}

impl Identity for Ed25519Identity {
    fn creator(&self) -> &Creator {
        &self.creator
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Identity")
            .field("msp_id", &self.creator.msp_id)
            .field("public_key", &hex::encode(self.public_key()))
            .finish()
    }
}

fn decode_seed(encoded: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(encoded)
        .map_err(|e| CoreError::Identity(format!("private key is not valid hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            CoreError::Identity(format!("private key must be 32 bytes, got {}", bytes.len()))
        })
}
