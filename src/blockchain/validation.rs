use std::collections::HashSet;

use serde_json::Value;

use super::block::Block;
use super::error::{LedgerError, Result};
use super::pow::meets_difficulty;
use super::transaction::Transaction;

/// Metadata field holding the external identifier that must stay unique
pub const RECORD_ID_FIELD: &str = "recordId";

/// Extracts the application record identifier from block metadata
///
/// Only string and numeric identifiers count; any other payload carries
/// no uniqueness constraint. Identifiers compare as JSON values, so `42`
/// and `"42"` are different records.
pub fn record_id(metadata: Option<&Value>) -> Option<&Value> {
    metadata?
        .get(RECORD_ID_FIELD)
        .filter(|id| id.is_string() || id.is_number())
}

fn describe_record(id: &Value) -> String {
    match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

/// Rejects metadata whose record identifier already occurs in the chain
pub fn ensure_unique_record(chain: &[Block], metadata: Option<&Value>) -> Result<()> {
    let Some(id) = record_id(metadata) else {
        return Ok(());
    };

    let taken = chain
        .iter()
        .any(|block| record_id(block.metadata.as_ref()) == Some(id));

    if taken {
        return Err(LedgerError::DuplicateApplicationRecord(describe_record(id)));
    }

    Ok(())
}

/// Collects the ids of every transaction already in the chain
pub fn confirmed_ids(chain: &[Block]) -> HashSet<&str> {
    chain
        .iter()
        .flat_map(|block| block.transactions.iter())
        .map(|tx| tx.transaction_id.as_str())
        .collect()
}

/// Rejects transactions that are already part of the chain
pub fn ensure_unconfirmed(chain: &[Block], transactions: &[Transaction]) -> Result<()> {
    let confirmed = confirmed_ids(chain);

    match transactions
        .iter()
        .find(|tx| confirmed.contains(tx.transaction_id.as_str()))
    {
        Some(tx) => Err(LedgerError::DuplicateTransaction(tx.transaction_id.clone())),
        None => Ok(()),
    }
}

/// Checks that `block` directly extends `previous`
fn check_linkage(block: &Block, previous: &Block) -> Result<()> {
    if block.previous_block_hash != previous.hash {
        return Err(LedgerError::InvalidChainLinkage(format!(
            "block {} points to {} but the previous hash is {}",
            block.index, block.previous_block_hash, previous.hash
        )));
    }

    if block.index != previous.index + 1 {
        return Err(LedgerError::InvalidChainLinkage(format!(
            "block index {} does not follow {}",
            block.index, previous.index
        )));
    }

    Ok(())
}

/// Rejects a block that carries the same transaction id twice
fn check_distinct_transactions(block: &Block) -> Result<()> {
    let mut seen = HashSet::new();
    match block
        .transactions
        .iter()
        .find(|tx| !seen.insert(tx.transaction_id.as_str()))
    {
        Some(tx) => Err(LedgerError::DuplicateTransaction(tx.transaction_id.clone())),
        None => Ok(()),
    }
}

/// Recomputes the block hash and checks it against the claim and the difficulty
pub fn verify_proof(block: &Block) -> Result<()> {
    let hash = block.calculate_hash()?;

    if hash != block.hash {
        return Err(LedgerError::InvalidProof(format!(
            "block {} claims hash {} but hashes to {}",
            block.index, block.hash, hash
        )));
    }

    if !meets_difficulty(&hash) {
        return Err(LedgerError::InvalidProof(format!(
            "block {} hash {} does not meet the difficulty",
            block.index, hash
        )));
    }

    Ok(())
}

/// Validates a candidate block against the current chain tip
///
/// Beyond linkage, the candidate's hash is recomputed from its fields and
/// must match the claimed hash and meet the difficulty. No transaction id
/// may repeat inside the candidate.
pub fn validate_new_block(candidate: &Block, tip: &Block) -> Result<()> {
    check_linkage(candidate, tip)?;
    verify_proof(candidate)?;
    check_distinct_transactions(candidate)
}

/// Validates an entire chain, stopping at the first violation
///
/// A chain holding only the genesis block is valid; an empty chain is not.
pub fn validate_chain(chain: &[Block]) -> Result<()> {
    match chain.first() {
        Some(genesis) if genesis.is_genesis() => {}
        _ => return Err(LedgerError::InvalidGenesis),
    }

    let mut transaction_ids = HashSet::new();
    let mut record_ids = HashSet::new();

    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        validate_new_block(block, previous)?;

        for tx in &block.transactions {
            if !transaction_ids.insert(tx.transaction_id.as_str()) {
                return Err(LedgerError::DuplicateTransaction(tx.transaction_id.clone()));
            }
        }

        // Keyed on the JSON text so strings and numbers stay distinct
        if let Some(id) = record_id(block.metadata.as_ref()) {
            if !record_ids.insert(id.to_string()) {
                return Err(LedgerError::DuplicateApplicationRecord(describe_record(id)));
            }
        }
    }

    Ok(())
}

/// Boolean form of [`validate_chain`]
pub fn is_valid_chain(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}
