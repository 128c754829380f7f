//! Stage counters for the periodic report

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic per-stage counters.
///
/// One instance is created per run and shared as an `Arc`. Workers only
/// increment; the reporter only reads.
#[derive(Debug, Default)]
pub struct PipelineStats {
    generated: AtomicU64,
    signed: AtomicU64,
    sign_failed: AtomicU64,
    endorse_attempts: AtomicU64,
    endorse_failed: AtomicU64,
    quorum_reached: AtomicU64,
    integrated: AtomicU64,
    integrate_failed: AtomicU64,
    broadcast_attempts: AtomicU64,
    broadcast_failed: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signed(&self) {
        self.signed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sign_failed(&self) {
        self.sign_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_endorse_attempt(&self) {
        self.endorse_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_endorse_failed(&self) {
        self.endorse_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quorum_reached(&self) {
        self.quorum_reached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_integrated(&self) {
        self.integrated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_integrate_failed(&self) {
        self.integrate_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_attempt(&self) {
        self.broadcast_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_failed(&self) {
        self.broadcast_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            signed: self.signed.load(Ordering::Relaxed),
            sign_failed: self.sign_failed.load(Ordering::Relaxed),
            endorse_attempts: self.endorse_attempts.load(Ordering::Relaxed),
            endorse_failed: self.endorse_failed.load(Ordering::Relaxed),
            quorum_reached: self.quorum_reached.load(Ordering::Relaxed),
            integrated: self.integrated.load(Ordering::Relaxed),
            integrate_failed: self.integrate_failed.load(Ordering::Relaxed),
            broadcast_attempts: self.broadcast_attempts.load(Ordering::Relaxed),
            broadcast_failed: self.broadcast_failed.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub generated: u64,
    pub signed: u64,
    pub sign_failed: u64,
    pub endorse_attempts: u64,
    pub endorse_failed: u64,
    pub quorum_reached: u64,
    pub integrated: u64,
    pub integrate_failed: u64,
    pub broadcast_attempts: u64,
    pub broadcast_failed: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generated={} signed={}/{} endorse={}/{} quorum={} integrated={}/{} broadcast={}/{}",
            self.generated,
            self.signed,
            self.sign_failed,
            self.endorse_attempts,
            self.endorse_failed,
            self.quorum_reached,
            self.integrated,
            self.integrate_failed,
            self.broadcast_attempts,
            self.broadcast_failed,
        )
    }
}
