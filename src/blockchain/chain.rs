use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::RwLock;

use super::block::{hash_block, Block, BlockData};
use super::consensus::{resolve, LedgerSnapshot};
use super::error::{LedgerError, Result};
use super::index::{self, AddressSummary, TransactionLookup};
use super::pool::TransactionPool;
use super::pow::{proof_of_work, CancelFlag};
use super::transaction::Transaction;
use super::validation::{
    confirmed_ids, ensure_unconfirmed, ensure_unique_record, is_valid_chain, validate_new_block,
};

/// The chain and pool pair, only ever mutated under one write lock
#[derive(Debug)]
struct LedgerState {
    /// The chain of blocks, genesis first, never empty
    chain: Vec<Block>,

    /// Pending transactions to be included in the next block
    pool: TransactionPool,

    /// Raised whenever the tip changes, abandoning searches on the old tip
    tip_changed: CancelFlag,
}

impl LedgerState {
    fn new() -> Self {
        LedgerState {
            chain: vec![Block::genesis()],
            pool: TransactionPool::new(),
            tip_changed: CancelFlag::new(),
        }
    }

    fn tip(&self) -> Result<&Block> {
        self.chain
            .last()
            .ok_or_else(|| LedgerError::SystemError("Chain has no blocks".to_string()))
    }

    fn advance_tip(&mut self) {
        self.tip_changed.cancel();
        self.tip_changed = CancelFlag::new();
    }
}

/// A proof of work search prepared against a specific tip
#[derive(Debug, Clone)]
pub struct MiningJob {
    pub previous_hash: String,
    pub data: BlockData,
    pub cancel: CancelFlag,
}

/// A freshly appended block and the reward queued for the next round
#[derive(Debug, Clone)]
pub struct MinedBlock {
    pub block: Block,
    pub reward: Transaction,
}

/// Represents the blockchain held by one node
///
/// Cloning the handle shares the same underlying ledger.
#[derive(Debug, Clone)]
pub struct Blockchain {
    state: Arc<RwLock<LedgerState>>,

    /// Identity credited with mining rewards
    node_id: String,
}

impl Blockchain {
    /// Creates a new blockchain holding only the genesis block
    ///
    /// # Arguments
    ///
    /// * `node_id` - The identity credited with mining rewards
    pub fn new(node_id: impl Into<String>) -> Self {
        Blockchain {
            state: Arc::new(RwLock::new(LedgerState::new())),
            node_id: node_id.into(),
        }
    }

    /// Gets the identity credited with mining rewards
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Adds a new transaction to the pending transactions
    ///
    /// # Returns
    ///
    /// The index of the block expected to include this transaction
    ///
    /// A transaction whose id is already pending or confirmed is ignored, so
    /// repeated deliveries from peers are harmless.
    pub async fn submit_transaction(&self, transaction: Transaction) -> Result<u64> {
        let mut state = self.state.write().await;
        let next_index = state.tip()?.index + 1;

        if confirmed_ids(&state.chain).contains(transaction.transaction_id.as_str()) {
            debug!("Ignoring confirmed transaction {}", transaction.transaction_id);
            return Ok(next_index);
        }

        let transaction_id = transaction.transaction_id.clone();
        if state.pool.add(transaction) {
            debug!("Queued transaction {} for block {}", transaction_id, next_index);
        } else {
            debug!("Ignoring already pending transaction {}", transaction_id);
        }

        Ok(next_index)
    }

    /// Mines a new block with the pending transactions
    ///
    /// The search runs on a blocking worker without holding the ledger
    /// lock. If the tip changes meanwhile, the search is abandoned and
    /// `StaleMiningTarget` is returned.
    ///
    /// # Arguments
    ///
    /// * `metadata` - Optional application payload sealed into the block
    pub async fn mine_next_block(&self, metadata: Option<Value>) -> Result<MinedBlock> {
        let job = self.prepare_mining(metadata).await?;

        let search = job.clone();
        let nonce = tokio::task::spawn_blocking(move || {
            proof_of_work(&search.previous_hash, &search.data, &search.cancel)
        })
        .await
        .map_err(|e| LedgerError::SystemError(format!("Mining task failed: {}", e)))??;

        self.seal(job, nonce).await
    }

    /// Snapshots the tip and pool into a mining job
    ///
    /// Metadata whose record id already exists is rejected here, before any
    /// work is spent. Pending transactions that are already confirmed are
    /// dropped from the pool, and each id enters the block once. When no reward is waiting in the pool, one
    /// crediting this node is minted into the block.
    pub async fn prepare_mining(&self, metadata: Option<Value>) -> Result<MiningJob> {
        let mut state = self.state.write().await;
        ensure_unique_record(&state.chain, metadata.as_ref())?;

        let pending = state.pool.snapshot();
        let (mut transactions, confirmed): (Vec<Transaction>, Vec<Transaction>) = {
            let known = confirmed_ids(&state.chain);
            pending
                .into_iter()
                .partition(|tx| !known.contains(tx.transaction_id.as_str()))
        };

        let mut seen = HashSet::new();
        transactions.retain(|tx| seen.insert(tx.transaction_id.clone()));

        if !confirmed.is_empty() {
            warn!(
                "Dropping {} pending transactions that are already confirmed",
                confirmed.len()
            );
            state.pool.remove_included(&confirmed);
        }

        if !state.pool.has_reward() {
            transactions.push(Transaction::new_reward(self.node_id.as_str()));
        }

        let tip = state.tip()?;
        info!(
            "Mining block {} with {} transactions",
            tip.index + 1,
            transactions.len()
        );

        Ok(MiningJob {
            previous_hash: tip.hash.clone(),
            data: BlockData {
                transactions,
                index: tip.index + 1,
                metadata,
            },
            cancel: state.tip_changed.clone(),
        })
    }

    /// Appends the block found for `job` and queues the next reward
    pub async fn seal(&self, job: MiningJob, nonce: u64) -> Result<MinedBlock> {
        let hash = hash_block(&job.previous_hash, nonce, &job.data)?;
        let block = Block::new(job.data, nonce, job.previous_hash, hash);

        let mut state = self.state.write().await;
        if job.cancel.is_cancelled() || state.tip()?.hash != block.previous_block_hash {
            info!("Abandoning block {}: the chain tip changed", block.index);
            return Err(LedgerError::StaleMiningTarget);
        }

        validate_new_block(&block, state.tip()?)?;

        state.pool.remove_included(&block.transactions);
        let reward = Transaction::new_reward(self.node_id.as_str());
        state.pool.add(reward.clone());
        state.chain.push(block.clone());
        state.advance_tip();

        info!("Mined block {} with hash {}", block.index, block.hash);

        Ok(MinedBlock { block, reward })
    }

    /// Appends a block received from a peer if it extends the current tip
    ///
    /// On success the pool is cleared entirely.
    pub async fn accept_peer_block(&self, block: Block) -> Result<()> {
        let mut state = self.state.write().await;

        validate_new_block(&block, state.tip()?)?;
        ensure_unique_record(&state.chain, block.metadata.as_ref())?;
        ensure_unconfirmed(&state.chain, &block.transactions)?;

        info!("Accepted peer block {} with hash {}", block.index, block.hash);
        state.chain.push(block);
        state.pool.drain();
        state.advance_tip();

        Ok(())
    }

    /// Replaces the chain and pool with the longest valid peer snapshot
    ///
    /// # Returns
    ///
    /// true if a peer chain was adopted
    pub async fn run_consensus(&self, peers: Vec<LedgerSnapshot>) -> bool {
        let mut state = self.state.write().await;

        let local_chain = std::mem::take(&mut state.chain);
        let local_pool = state.pool.drain();
        let resolution = resolve(local_chain, local_pool, peers);

        state.chain = resolution.chain;
        state.pool = TransactionPool::from_transactions(resolution.pending_transactions);
        if resolution.replaced {
            state.advance_tip();
        }

        resolution.replaced
    }

    /// Gets the entire blockchain
    pub async fn chain(&self) -> Vec<Block> {
        self.state.read().await.chain.clone()
    }

    /// Gets all pending transactions
    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.pool.snapshot()
    }

    /// Gets the chain and pool as one consistent snapshot
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read().await;
        LedgerSnapshot {
            chain: state.chain.clone(),
            pending_transactions: state.pool.snapshot(),
        }
    }

    /// Gets a block by its hash
    pub async fn block(&self, hash: &str) -> Result<Block> {
        let state = self.state.read().await;
        index::find_block(&state.chain, hash)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Block with hash {} not found", hash)))
    }

    /// Gets a confirmed transaction and the block holding it
    pub async fn transaction(&self, id: &str) -> Result<TransactionLookup> {
        let state = self.state.read().await;
        index::find_transaction(&state.chain, id)
            .ok_or_else(|| LedgerError::NotFound(format!("Transaction with ID {} not found", id)))
    }

    /// Gets every confirmed transaction touching `account` and its balance
    pub async fn address_summary(&self, account: &str) -> AddressSummary {
        let state = self.state.read().await;
        index::address_summary(&state.chain, account)
    }

    /// Validates the blockchain
    pub async fn is_valid(&self) -> bool {
        is_valid_chain(&self.state.read().await.chain)
    }
}
