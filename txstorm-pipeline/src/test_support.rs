//! In-memory collaborators for pipeline unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use txstorm_core::{
    create_proposal, AckReceiver, AckStatus, BroadcastAck, BroadcastSender, CommitObserver,
    Connector, CoreError, Ed25519Identity, Endorsement, Endorser, Envelope, Identity,
    ObserverReport, OrdererStream, ProposalResponse, Result, SharedRecord, SignedProposal,
    TxRecord,
};

/// Poll `condition` until it holds; panics after five seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}

pub fn identity() -> Arc<dyn Identity> {
    Arc::new(Ed25519Identity::from_seed("Org1MSP", [7u8; 32], None))
}

pub fn record(identity: &dyn Identity) -> SharedRecord {
    let args = vec!["CreateAsset".to_string(), "asset1".to_string()];
    TxRecord::shared(create_proposal(identity, "mychannel", "basic", "1.0", &args).unwrap())
}

pub fn signed_record(identity: &dyn Identity) -> SharedRecord {
    let record = record(identity);
    record
        .set_signed(identity.sign_proposal(record.proposal()).unwrap())
        .unwrap();
    record
}

pub fn endorsed(addr: &str) -> ProposalResponse {
    ProposalResponse {
        endorser: addr.to_string(),
        status: 200,
        message: "OK".to_string(),
        payload: b"asset1 created".to_vec(),
        endorsement: Some(Endorsement {
            endorser: addr.as_bytes().to_vec(),
            signature: vec![1, 2, 3],
        }),
    }
}

/// How a mock endorser answers
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Endorse,
    /// Transport error on every call
    Fail,
    /// Reply with this status
    Status(i32),
    /// Transport error on the first `n` calls, then endorse
    FailTimes(usize),
    /// Never reply
    Hang,
}

pub struct MockEndorser {
    addr: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Endorser for MockEndorser {
    async fn process_proposal(&self, _signed: &SignedProposal) -> Result<ProposalResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Endorse => Ok(endorsed(&self.addr)),
            Behavior::Fail => Err(CoreError::Transport("connection reset".to_string())),
            Behavior::Status(status) => Ok(ProposalResponse {
                status,
                message: "rejected".to_string(),
                ..endorsed(&self.addr)
            }),
            Behavior::FailTimes(n) if call < n => {
                Err(CoreError::Transport("unavailable".to_string()))
            }
            Behavior::FailTimes(_) => Ok(endorsed(&self.addr)),
            Behavior::Hang => std::future::pending().await,
        }
    }

    fn address(&self) -> &str {
        &self.addr
    }
}

/// Mock network: endorsers keyed by address plus one ordering service
pub struct MockNetwork {
    behaviors: HashMap<String, Behavior>,
    ack: Result<AckStatus>,
    refuse: Vec<String>,
    pub endorse_calls: Arc<AtomicUsize>,
    pub envelopes: Arc<Mutex<Vec<Envelope>>>,
    broadcast: Arc<watch::Sender<u64>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        let (broadcast, _) = watch::channel(0);
        Self {
            behaviors: HashMap::new(),
            ack: Ok(AckStatus::Success),
            refuse: Vec::new(),
            endorse_calls: Arc::new(AtomicUsize::new(0)),
            envelopes: Arc::new(Mutex::new(Vec::new())),
            broadcast: Arc::new(broadcast),
        }
    }

    pub fn endorser(mut self, addr: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(addr.to_string(), behavior);
        self
    }

    pub fn ack_status(mut self, status: AckStatus) -> Self {
        self.ack = Ok(status);
        self
    }

    pub fn ack_error(mut self, message: &str) -> Self {
        self.ack = Err(CoreError::Transport(message.to_string()));
        self
    }

    pub fn refuse(mut self, addr: &str) -> Self {
        self.refuse.push(addr.to_string());
        self
    }

    /// Observer that completes once `target` envelopes were accepted
    pub fn observer(&self) -> MockObserver {
        MockObserver {
            broadcast: self.broadcast.subscribe(),
            started: Mutex::new(None),
        }
    }

    pub fn broadcast_count(&self) -> usize {
        self.envelopes.lock().len()
    }
}

#[async_trait]
impl Connector for MockNetwork {
    async fn connect_endorser(&self, addr: &str, _tls_ca_cert: &[u8]) -> Result<Box<dyn Endorser>> {
        if self.refuse.iter().any(|a| a == addr) {
            return Err(CoreError::Connection {
                addr: addr.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let behavior = self.behaviors.get(addr).copied().unwrap_or(Behavior::Endorse);
        Ok(Box::new(MockEndorser {
            addr: addr.to_string(),
            behavior,
            calls: self.endorse_calls.clone(),
        }))
    }

    async fn connect_orderer(&self, addr: &str, _tls_ca_cert: &[u8]) -> Result<OrdererStream> {
        if self.refuse.iter().any(|a| a == addr) {
            return Err(CoreError::Connection {
                addr: addr.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let (acks_tx, acks_rx) = async_channel::unbounded();
        let ack = match &self.ack {
            Ok(status) => Ok(*status),
            Err(e) => Err(e.to_string()),
        };
        Ok(OrdererStream {
            sender: Box::new(MockSender {
                ack,
                acks: acks_tx,
                envelopes: self.envelopes.clone(),
                broadcast: self.broadcast.clone(),
            }),
            acks: Box::new(MockAcks { acks: acks_rx }),
        })
    }
}

struct MockSender {
    ack: std::result::Result<AckStatus, String>,
    acks: async_channel::Sender<std::result::Result<BroadcastAck, String>>,
    envelopes: Arc<Mutex<Vec<Envelope>>>,
    broadcast: Arc<watch::Sender<u64>>,
}

#[async_trait]
impl BroadcastSender for MockSender {
    async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.envelopes.lock().push(envelope.clone());
        // Rejected envelopes never reach the ledger
        if matches!(self.ack, Ok(AckStatus::Success)) {
            self.broadcast.send_modify(|n| *n += 1);
        }
        let ack = self.ack.clone().map(|status| BroadcastAck {
            status,
            info: String::new(),
        });
        let _ = self.acks.send(ack).await;
        Ok(())
    }
}

struct MockAcks {
    acks: async_channel::Receiver<std::result::Result<BroadcastAck, String>>,
}

#[async_trait]
impl AckReceiver for MockAcks {
    async fn recv(&mut self) -> Result<Option<BroadcastAck>> {
        match self.acks.recv().await {
            Ok(Ok(ack)) => Ok(Some(ack)),
            Ok(Err(message)) => Err(CoreError::Transport(message)),
            Err(_) => Ok(None),
        }
    }
}

pub struct MockObserver {
    broadcast: watch::Receiver<u64>,
    started: Mutex<Option<(u64, Instant)>>,
}

#[async_trait]
impl CommitObserver for MockObserver {
    fn start(&self, target: u64, start: Instant) -> Result<()> {
        *self.started.lock() = Some((target, start));
        Ok(())
    }

    async fn wait(&self) -> Result<ObserverReport> {
        let (target, start) = (*self.started.lock())
            .ok_or_else(|| CoreError::Observer("observer not started".to_string()))?;
        let mut rx = self.broadcast.clone();
        let confirmed = *rx
            .wait_for(|n| *n >= target)
            .await
            .map_err(|e| CoreError::Observer(e.to_string()))?;
        Ok(ObserverReport {
            confirmed,
            elapsed: start.elapsed(),
        })
    }
}
