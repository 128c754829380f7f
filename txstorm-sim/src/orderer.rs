//! Simulated ordering service
//!
//! Every broadcast stream feeds one shared ordering task, which cuts blocks
//! once `block_size` envelopes are pending or `block_timeout` has passed
//! since the first of them arrived.

use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};
use txstorm_core::{
    AckReceiver, AckStatus, BroadcastAck, BroadcastSender, CoreError, Envelope, Result,
};

use crate::ledger::Ledger;

/// Block cutting parameters
#[derive(Debug, Clone, Copy)]
pub struct BlockCutter {
    pub block_size: usize,
    pub block_timeout: Duration,
}

/// Consume envelopes until every sender is gone, committing blocks to
/// `ledger`
pub async fn run_orderer(envelopes: Receiver<Envelope>, cutter: BlockCutter, ledger: Arc<Ledger>) {
    let mut pending: Vec<Envelope> = Vec::with_capacity(cutter.block_size);
    let mut deadline: Option<Instant> = None;

    loop {
        let timeout = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            received = envelopes.recv() => match received {
                Ok(envelope) => {
                    if pending.is_empty() {
                        deadline = Some(Instant::now() + cutter.block_timeout);
                    }
                    pending.push(envelope);
                    if pending.len() >= cutter.block_size {
                        cut(&mut pending, &ledger);
                        deadline = None;
                    }
                }
                Err(_) => {
                    cut(&mut pending, &ledger);
                    debug!("Ordering service stopped");
                    return;
                }
            },
            _ = timeout => {
                cut(&mut pending, &ledger);
                deadline = None;
            }
        }
    }
}

fn cut(pending: &mut Vec<Envelope>, ledger: &Ledger) {
    if pending.is_empty() {
        return;
    }
    let block = ledger.append(pending.len() as u64);
    trace!(block = block.number, txs = block.tx_count, "Cut block");
    pending.clear();
}

/// Sending half of a simulated broadcast stream
pub struct SimBroadcastSender {
    pub(crate) orderer: Sender<Envelope>,
    pub(crate) acks: Sender<BroadcastAck>,
    pub(crate) ack_status: AckStatus,
    pub(crate) latency: Duration,
}

#[async_trait]
impl BroadcastSender for SimBroadcastSender {
    async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        // A rejected envelope is acknowledged but never ordered
        if self.ack_status.is_success() {
            self.orderer
                .send(envelope.clone())
                .await
                .map_err(|_| CoreError::StreamClosed("ordering service stopped".to_string()))?;
        }

        let info = if self.ack_status.is_success() {
            String::new()
        } else {
            format!("rejected {}", envelope.tx_id)
        };
        self.acks
            .send(BroadcastAck {
                status: self.ack_status,
                info,
            })
            .await
            .map_err(|_| CoreError::StreamClosed("ack stream closed".to_string()))
    }
}

/// Acknowledgment half of a simulated broadcast stream
pub struct SimAckReceiver {
    pub(crate) acks: Receiver<BroadcastAck>,
}

#[async_trait]
impl AckReceiver for SimAckReceiver {
    async fn recv(&mut self) -> Result<Option<BroadcastAck>> {
        Ok(self.acks.recv().await.ok())
    }
}
