//! In-memory `PeerClient` for tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::PeerClient;
use super::error::NetworkError;
use crate::blockchain::{Block, LedgerSnapshot, Transaction};

/// Records every call and answers from canned snapshots
#[derive(Default)]
pub struct MockPeerClient {
    failing: HashSet<String>,
    snapshots: HashMap<String, LedgerSnapshot>,
    calls: Mutex<Vec<String>>,
}

impl MockPeerClient {
    /// Creates a client whose calls to `peers` fail
    pub fn failing(peers: &[&str]) -> Self {
        MockPeerClient {
            failing: peers.iter().map(|peer| peer.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Serves `snapshot` when `peer` is asked for its chain
    pub fn with_snapshot(mut self, peer: &str, snapshot: LedgerSnapshot) -> Self {
        self.snapshots.insert(peer.to_string(), snapshot);
        self
    }

    /// Gets the recorded calls in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, peer: &str, call: String) -> Result<(), NetworkError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(peer) {
            return Err(NetworkError::Rejected {
                peer: peer.to_string(),
                item: "request".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PeerClient for MockPeerClient {
    async fn fetch_snapshot(&self, peer: &str) -> Result<LedgerSnapshot, NetworkError> {
        self.record(peer, format!("snapshot {}", peer))?;
        Ok(self.snapshots.get(peer).cloned().unwrap_or(LedgerSnapshot {
            chain: vec![Block::genesis()],
            pending_transactions: Vec::new(),
        }))
    }

    async fn send_transaction(&self, peer: &str, _transaction: &Transaction) -> Result<(), NetworkError> {
        self.record(peer, format!("transaction {}", peer))
    }

    async fn send_block(&self, peer: &str, block: &Block) -> Result<(), NetworkError> {
        self.record(peer, format!("block {} {}", peer, block.index))
    }

    async fn register_node(&self, peer: &str, _node_url: &str) -> Result<(), NetworkError> {
        self.record(peer, format!("register {}", peer))
    }

    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<(), NetworkError> {
        self.record(peer, format!("bulk {} {}", peer, node_urls.join(",")))
    }
}
