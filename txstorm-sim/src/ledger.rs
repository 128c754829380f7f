//! Append-only block log with commit notifications

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_BUFFER: usize = 1024;

/// Notification for one committed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub number: u64,
    pub tx_count: u64,
    /// Transactions committed up to and including this block
    pub total_txs: u64,
}

#[derive(Debug, Default)]
struct Chain {
    height: u64,
    total_txs: u64,
}

/// The simulated ledger
pub struct Ledger {
    chain: Mutex<Chain>,
    events: broadcast::Sender<BlockEvent>,
}

impl Ledger {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            chain: Mutex::new(Chain::default()),
            events,
        }
    }

    /// Commit a block of `tx_count` transactions
    pub fn append(&self, tx_count: u64) -> BlockEvent {
        let mut chain = self.chain.lock();
        chain.total_txs += tx_count;
        let event = BlockEvent {
            number: chain.height,
            tx_count,
            total_txs: chain.total_txs,
        };
        chain.height += 1;

        // Sent under the lock so subscribers see blocks in order
        if self.events.send(event).is_err() {
            trace!(block = event.number, "No block subscribers");
        }
        event
    }

    pub fn height(&self) -> u64 {
        self.chain.lock().height
    }

    pub fn total_txs(&self) -> u64 {
        self.chain.lock().total_txs
    }

    /// Subscribe to future blocks, returning the transaction total at the
    /// moment of subscription
    pub fn subscribe(&self) -> (u64, broadcast::Receiver<BlockEvent>) {
        let chain = self.chain.lock();
        (chain.total_txs, self.events.subscribe())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
