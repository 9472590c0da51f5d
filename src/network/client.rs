use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::error::NetworkError;
use super::message::{BlockReceipt, NewBlockMessage, RegisterNodeMessage, RegisterNodesBulkMessage};
use crate::blockchain::{Block, LedgerSnapshot, Transaction};

/// Calls a single peer's endpoints
///
/// The ledger never talks to peers itself; the network layer goes through
/// this trait so fan-out logic can be exercised without sockets.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetches the peer's chain and pending transactions
    async fn fetch_snapshot(&self, peer: &str) -> Result<LedgerSnapshot, NetworkError>;

    /// Hands a pending transaction to the peer
    async fn send_transaction(&self, peer: &str, transaction: &Transaction) -> Result<(), NetworkError>;

    /// Delivers a newly mined block to the peer
    async fn send_block(&self, peer: &str, block: &Block) -> Result<(), NetworkError>;

    /// Tells the peer about a node URL
    async fn register_node(&self, peer: &str, node_url: &str) -> Result<(), NetworkError>;

    /// Tells a newly joined peer about every node of the network
    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<(), NetworkError>;
}

/// `PeerClient` speaking JSON over HTTP to other ledger nodes
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    /// Creates a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpPeerClient { client })
    }

    fn endpoint(peer: &str, path: &str) -> Result<String, NetworkError> {
        if !(peer.starts_with("http://") || peer.starts_with("https://")) {
            return Err(NetworkError::InvalidUrl(peer.to_string()));
        }
        Ok(format!("{}/api/v1/{}", peer.trim_end_matches('/'), path))
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        peer: &str,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, NetworkError> {
        let response = self
            .client
            .post(Self::endpoint(peer, path)?)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_snapshot(&self, peer: &str) -> Result<LedgerSnapshot, NetworkError> {
        let snapshot = self
            .client
            .get(Self::endpoint(peer, "blockchain")?)
            .send()
            .await?
            .error_for_status()?
            .json::<LedgerSnapshot>()
            .await?;
        Ok(snapshot)
    }

    async fn send_transaction(&self, peer: &str, transaction: &Transaction) -> Result<(), NetworkError> {
        self.post(peer, "transaction", transaction).await?;
        Ok(())
    }

    async fn send_block(&self, peer: &str, block: &Block) -> Result<(), NetworkError> {
        let message = NewBlockMessage {
            new_block: block.clone(),
        };
        let receipt = self
            .post(peer, "receive-new-block", &message)
            .await?
            .json::<BlockReceipt>()
            .await?;

        if !receipt.accepted {
            return Err(NetworkError::Rejected {
                peer: peer.to_string(),
                item: format!("block {}", block.index),
            });
        }
        Ok(())
    }

    async fn register_node(&self, peer: &str, node_url: &str) -> Result<(), NetworkError> {
        let message = RegisterNodeMessage {
            new_node_url: node_url.to_string(),
        };
        self.post(peer, "register-node", &message).await?;
        Ok(())
    }

    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<(), NetworkError> {
        let message = RegisterNodesBulkMessage {
            all_network_nodes: node_urls.to_vec(),
        };
        self.post(peer, "register-nodes-bulk", &message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            HttpPeerClient::endpoint("http://localhost:3002/", "blockchain").unwrap(),
            "http://localhost:3002/api/v1/blockchain"
        );
        assert!(matches!(
            HttpPeerClient::endpoint("localhost:3002", "blockchain"),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_an_error() {
        let client = HttpPeerClient::new(Duration::from_millis(500)).unwrap();

        // Port 9 (discard) is not served by a ledger node
        let result = client.fetch_snapshot("http://127.0.0.1:9").await;
        assert!(result.is_err());
    }
}
