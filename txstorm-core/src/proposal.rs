//! Proposal construction

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::identity::Identity;
use crate::types::Proposal;

const NONCE_LEN: usize = 24;

/// Build an unsigned chaincode invocation proposal.
///
/// The transaction id is the hex SHA-256 of a fresh random nonce followed by
/// the creator identity bytes, so every proposal gets a distinct id.
pub fn create_proposal<I>(
    identity: &I,
    channel: &str,
    chaincode: &str,
    version: &str,
    args: &[String],
) -> Result<Proposal>
where
    I: Identity + ?Sized,
{
    let creator = identity.creator().clone();

    let mut nonce = vec![0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let mut hasher = Sha256::new();
    hasher.update(&nonce);
    hasher.update(&creator.id_bytes);
    let tx_id = hex::encode(hasher.finalize());

    Ok(Proposal {
        tx_id,
        channel: channel.to_string(),
        chaincode: chaincode.to_string(),
        version: version.to_string(),
        args: args.to_vec(),
        creator,
        nonce,
        timestamp: Utc::now(),
    })
}
