// Network module
//
// Thin transport around the ledger: peer registry, an HTTP peer client and
// best-effort fan-out. Every peer is handled independently; one failing
// peer never stops the others or the local ledger.

pub mod client;
pub mod error;
pub mod message;
pub mod peer;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use log::{info, warn};

pub use client::{HttpPeerClient, PeerClient};
pub use error::NetworkError;
pub use peer::PeerRegistry;

use crate::blockchain::{Block, LedgerSnapshot, Transaction};

/// How many peers a fan-out reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Fans ledger events out to every known peer
#[derive(Clone)]
pub struct Network {
    registry: Arc<PeerRegistry>,
    client: Arc<dyn PeerClient>,
}

impl Network {
    pub fn new(registry: PeerRegistry, client: Arc<dyn PeerClient>) -> Self {
        Network {
            registry: Arc::new(registry),
            client,
        }
    }

    /// Gets the peer registry
    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Runs `call` against every peer concurrently and tallies the outcome
    async fn fan_out<F, Fut>(&self, peers: Vec<String>, action: &str, call: F) -> BroadcastReport
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<(), NetworkError>>,
    {
        let calls = peers.into_iter().map(|peer| {
            let pending = call(peer.clone());
            async move { (peer, pending.await) }
        });

        let mut report = BroadcastReport::default();
        for (peer, result) in join_all(calls).await {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    warn!("Failed to {} to {}: {}", action, peer, err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Hands a transaction to every peer's pool
    pub async fn broadcast_transaction(&self, transaction: &Transaction) -> BroadcastReport {
        let client = &self.client;
        self.fan_out(self.registry.peers(), "send transaction", |peer| async move {
            client.send_transaction(&peer, transaction).await
        })
        .await
    }

    /// Delivers a newly mined block to every peer
    pub async fn broadcast_block(&self, block: &Block) -> BroadcastReport {
        let client = &self.client;
        let report = self
            .fan_out(self.registry.peers(), "send block", |peer| async move {
                client.send_block(&peer, block).await
            })
            .await;

        info!(
            "Block {} delivered to {} peers ({} failed)",
            block.index, report.succeeded, report.failed
        );
        report
    }

    /// Fetches every peer's snapshot, skipping peers that fail to answer
    pub async fn collect_snapshots(&self) -> Vec<LedgerSnapshot> {
        let client = &self.client;
        let fetches = self.registry.peers().into_iter().map(|peer| async move {
            let result = client.fetch_snapshot(&peer).await;
            (peer, result)
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(peer, result)| match result {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    warn!("Failed to fetch chain from {}: {}", peer, err);
                    None
                }
            })
            .collect()
    }

    /// Registers a node locally, announces it to every peer and hands it
    /// the full list of nodes
    ///
    /// The bulk hand-off counts as one more peer in the report.
    pub async fn register_and_broadcast(&self, new_node_url: &str) -> BroadcastReport {
        self.registry.register(new_node_url);

        let client = &self.client;
        let existing: Vec<String> = self
            .registry
            .peers()
            .into_iter()
            .filter(|peer| peer.as_str() != new_node_url.trim_end_matches('/'))
            .collect();

        let mut report = self
            .fan_out(existing.clone(), "announce node", |peer| async move {
                client.register_node(&peer, new_node_url).await
            })
            .await;

        let mut all_nodes = existing;
        all_nodes.push(self.registry.current_node_url().to_string());
        match self.client.register_nodes_bulk(new_node_url, &all_nodes).await {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                warn!("Failed to hand node list to {}: {}", new_node_url, err);
                report.failed += 1;
            }
        }

        report
    }
}
