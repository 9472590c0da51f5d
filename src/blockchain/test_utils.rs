//! Helpers shared by the ledger tests

use serde_json::Value;

use super::block::{hash_block, Block, BlockData};
use super::pow::{proof_of_work, CancelFlag};
use super::transaction::Transaction;

/// Mines a valid block on top of `previous`
pub fn mine_on(previous: &Block, transactions: Vec<Transaction>, metadata: Option<Value>) -> Block {
    let data = BlockData {
        transactions,
        index: previous.index + 1,
        metadata,
    };
    let nonce = proof_of_work(&previous.hash, &data, &CancelFlag::new()).unwrap();
    let hash = hash_block(&previous.hash, nonce, &data).unwrap();

    Block::new(data, nonce, previous.hash.clone(), hash)
}

/// Builds a valid chain of genesis plus `blocks` mined blocks, one transfer each
pub fn build_chain(blocks: usize) -> Vec<Block> {
    let mut chain = vec![Block::genesis()];

    for i in 0..blocks {
        let tx = Transaction::new(i as f64 + 1.0, "alice", "bob");
        let next = mine_on(chain.last().unwrap(), vec![tx], None);
        chain.push(next);
    }

    chain
}
