//! The simulated network as seen by the pipeline

use async_channel::Sender;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use txstorm_config::SimulationConfig;
use txstorm_core::{Connector, CoreError, Endorser, Envelope, OrdererStream, Result};

use crate::endorser::{EndorserProfile, SimEndorser};
use crate::ledger::Ledger;
use crate::observer::SimCommitObserver;
use crate::orderer::{run_orderer, BlockCutter, SimAckReceiver, SimBroadcastSender};

const PEM_CERT_MARKER: &[u8] = b"-----BEGIN CERTIFICATE-----";
const ORDERER_QUEUE: usize = 1024;

/// Endorsers, one ordering service and a ledger, all in-process
pub struct SimNetwork {
    config: SimulationConfig,
    failing: HashSet<String>,
    ledger: Arc<Ledger>,
    orderer: Sender<Envelope>,
}

impl SimNetwork {
    /// Create the network and spawn its ordering task.
    ///
    /// Must be called from within a tokio runtime. The ordering task stops
    /// once the network and every stream opened on it are dropped.
    pub fn new(config: SimulationConfig) -> Self {
        let ledger = Arc::new(Ledger::new());
        let (orderer, envelopes) = async_channel::bounded(ORDERER_QUEUE);
        let cutter = BlockCutter {
            block_size: config.block_size.max(1),
            block_timeout: config.block_timeout,
        };
        tokio::spawn(run_orderer(envelopes, cutter, ledger.clone()));

        Self {
            failing: config.failing_endorsers.iter().cloned().collect(),
            config,
            ledger,
            orderer,
        }
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        self.ledger.clone()
    }

    /// Commit observer attached to this network's ledger
    pub fn observer(&self, committer: &str) -> SimCommitObserver {
        SimCommitObserver::new(&self.ledger, committer)
    }
}

fn check_endpoint(addr: &str, tls_ca_cert: &[u8]) -> Result<()> {
    if addr.trim().is_empty() {
        return Err(CoreError::Connection {
            addr: addr.to_string(),
            reason: "empty address".to_string(),
        });
    }
    let has_cert = tls_ca_cert
        .windows(PEM_CERT_MARKER.len())
        .any(|window| window == PEM_CERT_MARKER);
    if !tls_ca_cert.is_empty() && !has_cert {
        return Err(CoreError::Connection {
            addr: addr.to_string(),
            reason: "TLS CA bundle holds no certificate".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl Connector for SimNetwork {
    async fn connect_endorser(&self, addr: &str, tls_ca_cert: &[u8]) -> Result<Box<dyn Endorser>> {
        check_endpoint(addr, tls_ca_cert)?;
        debug!(addr, tls = !tls_ca_cert.is_empty(), "Connected to simulated endorser");

        let profile = EndorserProfile {
            latency: self.config.endorse_latency,
            failure_rate: self.config.endorse_failure_rate,
            unavailable: self.failing.contains(addr),
        };
        Ok(Box::new(SimEndorser::new(addr, profile)))
    }

    async fn connect_orderer(&self, addr: &str, tls_ca_cert: &[u8]) -> Result<OrdererStream> {
        check_endpoint(addr, tls_ca_cert)?;
        debug!(addr, tls = !tls_ca_cert.is_empty(), "Connected to simulated orderer");

        let (acks_tx, acks_rx) = async_channel::unbounded();
        Ok(OrdererStream {
            sender: Box::new(SimBroadcastSender {
                orderer: self.orderer.clone(),
                acks: acks_tx,
                ack_status: self.config.ack_status,
                latency: self.config.broadcast_latency,
            }),
            acks: Box::new(SimAckReceiver { acks: acks_rx }),
        })
    }
}
