use log::{info, warn};
use serde_json::Value;

use crate::blockchain::{Block, Blockchain, LedgerError, MinedBlock, Transaction};
use crate::network::{BroadcastReport, Network};

/// A ledger paired with the network layer that feeds it
///
/// The ledger decides; the node only moves its inputs and outputs between
/// peers. Peer failures are logged and never undo local progress.
#[derive(Clone)]
pub struct Node {
    pub blockchain: Blockchain,
    pub network: Network,
}

impl Node {
    pub fn new(blockchain: Blockchain, network: Network) -> Self {
        Node { blockchain, network }
    }

    /// Submits a transaction locally and hands it to every peer
    ///
    /// # Returns
    ///
    /// The index of the block expected to include it and the fan-out report
    pub async fn submit_and_broadcast(
        &self,
        transaction: Transaction,
    ) -> Result<(u64, BroadcastReport), LedgerError> {
        let block_index = self.blockchain.submit_transaction(transaction.clone()).await?;
        let report = self.network.broadcast_transaction(&transaction).await;
        Ok((block_index, report))
    }

    /// Mines the next block, then delivers it and the queued reward to peers
    ///
    /// The block goes out first so peers clear their pools before the
    /// reward lands in them.
    pub async fn mine_and_broadcast(&self, metadata: Option<Value>) -> Result<MinedBlock, LedgerError> {
        let mined = self.blockchain.mine_next_block(metadata).await?;

        self.network.broadcast_block(&mined.block).await;
        self.network.broadcast_transaction(&mined.reward).await;

        Ok(mined)
    }

    /// Appends a block delivered by a peer
    pub async fn receive_block(&self, block: Block) -> Result<(), LedgerError> {
        let index = block.index;
        self.blockchain.accept_peer_block(block).await.map_err(|err| {
            warn!("Rejected peer block {}: {}", index, err);
            err
        })
    }

    /// Polls every peer and adopts the longest valid chain
    ///
    /// # Returns
    ///
    /// true if the local chain was replaced
    pub async fn consensus(&self) -> bool {
        let snapshots = self.network.collect_snapshots().await;
        info!("Running consensus over {} peer chains", snapshots.len());
        self.blockchain.run_consensus(snapshots).await
    }
}
