//! Broadcast pool
//!
//! One sender and one drain task per ordering-service connection. Sends are
//! fire-and-forget; acknowledgments are not correlated with transactions and
//! only report the health of the stream, so any error or non-success status
//! on the drain side aborts the run.

use async_channel::Receiver;
use std::sync::Arc;
use tracing::{debug, error, info, trace};
use txstorm_core::{AckReceiver, BroadcastSender, Connector, OrdererStream, SharedRecord};
use txstorm_resilience::{ShutdownCoordinator, ShutdownSignal};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::{recv_or_shutdown, WorkerPool};
use crate::settings::Endpoint;
use crate::stats::PipelineStats;

/// Broadcast streams to the ordering service
pub struct BroadcasterPool {
    streams: Vec<OrdererStream>,
}

impl BroadcasterPool {
    /// Open `num_of_conn` streams; the first failure aborts startup
    pub async fn connect(
        connector: &dyn Connector,
        orderer: &Endpoint,
        num_of_conn: usize,
    ) -> PipelineResult<Self> {
        let mut streams = Vec::with_capacity(num_of_conn);
        for _ in 0..num_of_conn {
            let stream = connector
                .connect_orderer(&orderer.addr, &orderer.tls_ca_cert)
                .await
                .map_err(|source| PipelineError::Connect {
                    addr: orderer.addr.clone(),
                    source,
                })?;
            streams.push(stream);
        }

        debug!(addr = %orderer.addr, num_of_conn, "Connected to orderer");
        Ok(Self { streams })
    }

    pub fn connections(&self) -> usize {
        self.streams.len()
    }

    /// Spawn a sender loop and a drain loop for every stream
    pub fn start(self, pool: &mut WorkerPool, envs: Receiver<SharedRecord>, stats: Arc<PipelineStats>) {
        let signal = pool.signal();
        let coordinator = pool.coordinator().clone();

        for (index, stream) in self.streams.into_iter().enumerate() {
            pool.spawn_task(
                "drain",
                index,
                run_drain(index, stream.acks, coordinator.clone()),
            );
            pool.spawn_task(
                "broadcaster",
                index,
                run_sender(stream.sender, envs.clone(), stats.clone(), signal.clone()),
            );
        }
    }
}

async fn run_sender(
    mut sender: Box<dyn BroadcastSender>,
    envs: Receiver<SharedRecord>,
    stats: Arc<PipelineStats>,
    signal: ShutdownSignal,
) {
    debug!("Start sending broadcast");
    while let Some(record) = recv_or_shutdown(&envs, &signal).await {
        let Some(envelope) = record.envelope() else {
            error!(tx_id = %record.tx_id(), "Record without envelope on broadcast channel");
            continue;
        };
        stats.record_broadcast_attempt();

        let sent = tokio::select! {
            biased;
            _ = signal.triggered() => break,
            sent = sender.send(envelope) => sent,
        };
        match sent {
            Ok(()) => trace!(tx_id = %record.tx_id(), "Broadcast envelope"),
            Err(e) => {
                stats.record_broadcast_failed();
                error!(tx_id = %record.tx_id(), error = %e, "Failed to broadcast env");
            }
        }
    }
}

async fn run_drain(index: usize, mut acks: Box<dyn AckReceiver>, coordinator: ShutdownCoordinator) {
    let signal = coordinator.signal();
    loop {
        let next = tokio::select! {
            biased;
            _ = signal.triggered() => return,
            next = acks.recv() => next,
        };

        match next {
            Ok(Some(ack)) if ack.status.is_success() => {}
            Ok(Some(ack)) => {
                coordinator.abort(format!(
                    "broadcast connection {} received erroneous status {}: {}",
                    index, ack.status, ack.info
                ));
                return;
            }
            Ok(None) => {
                info!(connection = index, "Broadcast ack stream closed");
                return;
            }
            Err(e) => {
                coordinator.abort(format!(
                    "broadcast connection {} ack stream failed: {}",
                    index, e
                ));
                return;
            }
        }
    }
}
