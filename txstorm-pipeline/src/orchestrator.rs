//! Wires the stages together and drives one run

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use txstorm_core::{CommitObserver, Connector, Identity};
use txstorm_resilience::ShutdownCoordinator;

use crate::broadcaster::BroadcasterPool;
use crate::channels::PipelineChannels;
use crate::endorser::ProposerPool;
use crate::error::{PipelineError, PipelineResult};
use crate::generator::{run_generator, split_quota};
use crate::integrator::IntegratorPool;
use crate::pool::WorkerPool;
use crate::reporter::Reporter;
use crate::settings::PipelineSettings;
use crate::signer::SignerPool;
use crate::stats::PipelineStats;

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Requested transaction count
    pub count: u64,
    /// Transactions the observer saw committed
    pub confirmed: u64,
    /// Time from the start of generation to confirmation of the target
    pub duration: Duration,
    pub tps: f64,
}

impl RunSummary {
    pub fn new(count: u64, confirmed: u64, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        let tps = if secs > 0.0 { count as f64 / secs } else { 0.0 };
        Self {
            count,
            confirmed,
            duration,
            tps,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx: {}, duration: {:?}, tps: {:.6}",
            self.count, self.duration, self.tps
        )
    }
}

/// Runs the signing, endorsement, integration and broadcast pools against
/// one set of collaborators.
///
/// The shutdown coordinator and the observer are single use, so an
/// orchestrator drives exactly one run.
pub struct Orchestrator {
    settings: PipelineSettings,
    identity: Arc<dyn Identity>,
    connector: Arc<dyn Connector>,
    observer: Arc<dyn CommitObserver>,
    stats: Arc<PipelineStats>,
    shutdown: ShutdownCoordinator,
    started: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        settings: PipelineSettings,
        identity: Arc<dyn Identity>,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn CommitObserver>,
    ) -> Self {
        Self {
            settings,
            identity,
            connector,
            observer,
            stats: Arc::new(PipelineStats::new()),
            shutdown: ShutdownCoordinator::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Coordinator shared by every worker; call `shutdown()` on it to
    /// interrupt a run
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Push `count` transactions through the pipeline and wait until the
    /// observer has seen them committed.
    ///
    /// A run never ends on its own if records are lost on the way; interrupt
    /// it through [`Orchestrator::shutdown_handle`]. Any call after the first
    /// fails with [`PipelineError::AlreadyRun`].
    pub async fn run(&self, count: u64) -> PipelineResult<RunSummary> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::AlreadyRun);
        }
        self.settings.validate()?;
        let settings = &self.settings;
        let threshold = settings.quorum_threshold();
        let channels = PipelineChannels::new(threshold, settings.channel_capacity);

        let proposers =
            ProposerPool::connect(self.connector.as_ref(), &settings.endorsers, settings.num_of_conn)
                .await?;
        let broadcasters =
            BroadcasterPool::connect(self.connector.as_ref(), &settings.orderer, settings.num_of_conn)
                .await?;

        let mut pool = WorkerPool::new(self.shutdown.clone());

        let reporter = Reporter::new(settings.report_interval, channels.clone(), self.stats.clone());
        let signal = pool.signal();
        pool.spawn_task("reporter", 0, reporter.run(signal));

        SignerPool::new(self.identity.clone(), self.stats.clone()).start(
            &mut pool,
            settings.workers,
            channels.raw.rx.clone(),
            channels.signed_senders(),
        );

        let inputs: Vec<_> = channels.signed.iter().map(|lane| lane.rx.clone()).collect();
        proposers.start(
            &mut pool,
            &inputs,
            channels.processed.tx.clone(),
            threshold,
            settings.endorsement_retry.clone(),
            self.stats.clone(),
        );

        IntegratorPool::new(self.identity.clone(), self.stats.clone(), threshold).start(
            &mut pool,
            settings.workers,
            channels.processed.rx.clone(),
            channels.envs.tx.clone(),
        );

        broadcasters.start(&mut pool, channels.envs.rx.clone(), self.stats.clone());

        let start = Instant::now();
        if let Err(e) = self.observer.start(count, start) {
            self.shutdown.shutdown();
            self.join(pool).await;
            return Err(PipelineError::Observer(e));
        }

        let template = Arc::new(settings.proposal.clone());
        for (task, quota) in split_quota(count, settings.generator_tasks)
            .into_iter()
            .enumerate()
        {
            if quota == 0 {
                continue;
            }
            pool.spawn_task(
                "generator",
                task,
                run_generator(
                    quota,
                    template.clone(),
                    self.identity.clone(),
                    channels.raw.tx.clone(),
                    self.stats.clone(),
                    self.shutdown.clone(),
                ),
            );
        }
        info!(count, threshold, workers = settings.workers, "Generating transactions");

        let signal = self.shutdown.signal();
        let observed = tokio::select! {
            biased;
            _ = signal.triggered() => None,
            report = self.observer.wait() => Some(report),
        };
        let duration = start.elapsed();

        self.shutdown.shutdown();
        self.join(pool).await;

        if let Some(reason) = self.shutdown.abort_reason() {
            return Err(PipelineError::Fatal(reason.to_string()));
        }

        match observed {
            Some(Ok(report)) => {
                info!(confirmed = report.confirmed, "Completed processing transactions");
                Ok(RunSummary::new(count, report.confirmed, duration))
            }
            Some(Err(e)) => Err(PipelineError::Observer(e)),
            None => Err(PipelineError::Interrupted { target: count }),
        }
    }

    async fn join(&self, pool: WorkerPool) {
        if let Err(e) = pool.join_all(self.settings.shutdown_grace).await {
            warn!("Workers did not stop within {:?}: {}", self.settings.shutdown_grace, e);
        }
    }
}
