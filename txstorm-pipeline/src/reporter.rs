//! Periodic console diagnostics

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;
use txstorm_resilience::ShutdownSignal;

use crate::channels::PipelineChannels;
use crate::stats::PipelineStats;

/// Samples channel depths and stage counters every `interval`
pub struct Reporter {
    interval: Duration,
    channels: PipelineChannels,
    stats: Arc<PipelineStats>,
}

impl Reporter {
    pub fn new(interval: Duration, channels: PipelineChannels, stats: Arc<PipelineStats>) -> Self {
        Self {
            interval,
            channels,
            stats,
        }
    }

    /// One diagnostics line for the current instant
    pub fn report_line(&self) -> String {
        format!("{} | {}", self.channels.depths(), self.stats.snapshot())
    }

    /// Print a line to stdout every interval until shutdown
    pub async fn run(self, signal: ShutdownSignal) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = signal.triggered() => return,
                _ = ticker.tick() => {
                    let line = self.report_line();
                    println!("{}", line);
                    debug!(report = %line, "Pipeline progress");
                }
            }
        }
    }
}
