//! Bounded channels between pipeline stages

use async_channel::{Receiver, Sender};
use std::fmt;
use txstorm_core::SharedRecord;

/// Both ends of one bounded multi-producer multi-consumer channel
#[derive(Debug, Clone)]
pub struct Lane {
    pub tx: Sender<SharedRecord>,
    pub rx: Receiver<SharedRecord>,
}

impl Lane {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        Self { tx, rx }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// The channels wiring generator, signers, endorsement lanes, integrators
/// and broadcasters together
#[derive(Debug, Clone)]
pub struct PipelineChannels {
    /// Generated, unsigned records
    pub raw: Lane,
    /// One lane per endorser carrying signed records
    pub signed: Vec<Lane>,
    /// Records that reached quorum
    pub processed: Lane,
    /// Records carrying an envelope
    pub envs: Lane,
}

impl PipelineChannels {
    /// Build every channel with the same capacity.
    ///
    /// `capacity` must be positive.
    pub fn new(endorsers: usize, capacity: usize) -> Self {
        Self {
            raw: Lane::bounded(capacity),
            signed: (0..endorsers).map(|_| Lane::bounded(capacity)).collect(),
            processed: Lane::bounded(capacity),
            envs: Lane::bounded(capacity),
        }
    }

    pub fn signed_senders(&self) -> Vec<Sender<SharedRecord>> {
        self.signed.iter().map(|lane| lane.tx.clone()).collect()
    }

    /// Sample current occupancy of every channel
    pub fn depths(&self) -> ChannelDepths {
        ChannelDepths {
            raw: self.raw.len(),
            signed: self.signed.iter().map(Lane::len).collect(),
            processed: self.processed.len(),
            envs: self.envs.len(),
        }
    }
}

/// Channel occupancy at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDepths {
    pub raw: usize,
    pub signed: Vec<usize>,
    pub processed: usize,
    pub envs: usize,
}

impl fmt::Display for ChannelDepths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "raw={} signed={:?} processed={} envs={}",
            self.raw, self.signed, self.processed, self.envs
        )
    }
}
