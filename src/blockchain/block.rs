use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::error::{LedgerError, Result};
use super::transaction::Transaction;

/// Nonce carried by the genesis block
pub const GENESIS_NONCE: u64 = 100;

/// Hash and previous hash carried by the genesis block
pub const GENESIS_HASH: &str = "0";

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Index of the block in the chain (genesis is 1)
    pub index: u64,

    /// Creation time in milliseconds since the Unix epoch
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64, example = 1700000000000i64)]
    pub timestamp: DateTime<Utc>,

    /// List of transactions included in this block
    pub transactions: Vec<Transaction>,

    /// Proof of work (nonce)
    pub nonce: u64,

    /// Hash of the current block
    pub hash: String,

    /// Hash of the previous block
    pub previous_block_hash: String,

    /// Optional application payload sealed into the block hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}

/// The part of a block covered by the proof of work
///
/// Field order is part of the hash: peers recompute it from the same
/// fields in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    pub transactions: Vec<Transaction>,
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl BlockData {
    /// Serializes the payload as compact JSON, the form fed to the hasher
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LedgerError::SystemError(e.to_string()))
    }
}

impl Block {
    /// Creates a sealed block from a mined payload
    ///
    /// # Arguments
    ///
    /// * `data` - The payload the nonce was found for
    /// * `nonce` - The proof of work
    /// * `previous_block_hash` - The hash of the block this one extends
    /// * `hash` - The hash of `(previous_block_hash, nonce, data)`
    pub fn new(data: BlockData, nonce: u64, previous_block_hash: String, hash: String) -> Self {
        Block {
            index: data.index,
            // Millisecond precision, as carried on the wire
            timestamp: Utc::now().trunc_subsecs(3),
            transactions: data.transactions,
            nonce,
            hash,
            previous_block_hash,
            metadata: data.metadata,
        }
    }

    /// Creates the canonical genesis block
    pub fn genesis() -> Self {
        Block {
            index: 1,
            timestamp: DateTime::<Utc>::default(),
            transactions: Vec::new(),
            nonce: GENESIS_NONCE,
            hash: GENESIS_HASH.to_string(),
            previous_block_hash: GENESIS_HASH.to_string(),
            metadata: None,
        }
    }

    /// Checks if this block carries the canonical genesis values
    ///
    /// The timestamp is not compared: every node stamps its own genesis.
    pub fn is_genesis(&self) -> bool {
        self.index == 1
            && self.nonce == GENESIS_NONCE
            && self.hash == GENESIS_HASH
            && self.previous_block_hash == GENESIS_HASH
            && self.transactions.is_empty()
            && self.metadata.is_none()
    }

    /// Gets the payload covered by this block's proof of work
    pub fn data(&self) -> BlockData {
        BlockData {
            transactions: self.transactions.clone(),
            index: self.index,
            metadata: self.metadata.clone(),
        }
    }

    /// Recomputes the block hash from its own fields
    pub fn calculate_hash(&self) -> Result<String> {
        hash_block(&self.previous_block_hash, self.nonce, &self.data())
    }
}

/// Hashes `(previous_hash, nonce, data)` into a hex SHA-256 digest
pub fn hash_block(previous_hash: &str, nonce: u64, data: &BlockData) -> Result<String> {
    Ok(digest(previous_hash, nonce, &data.to_json()?))
}

/// Hashes an already serialized payload
///
/// The proof of work calls this directly so the payload is serialized once
/// per search instead of once per nonce.
pub fn digest(previous_hash: &str, nonce: u64, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_data() -> BlockData {
        BlockData {
            transactions: vec![Transaction::new(10.0, "alice", "bob")],
            index: 2,
            metadata: None,
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let data = sample_data();

        let first = hash_block("previous_hash", 42, &data).unwrap();
        let second = hash_block("previous_hash", 42, &data).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64); // SHA-256 hash is 64 characters in hex
    }

    #[test]
    fn test_hash_depends_on_every_input() {
        let data = sample_data();
        let base = hash_block("previous_hash", 42, &data).unwrap();

        assert_ne!(base, hash_block("other_hash", 42, &data).unwrap());
        assert_ne!(base, hash_block("previous_hash", 43, &data).unwrap());

        let mut with_metadata = data.clone();
        with_metadata.metadata = Some(json!({"recordId": "r-1"}));
        assert_ne!(base, hash_block("previous_hash", 42, &with_metadata).unwrap());
    }

    #[test]
    fn test_payload_field_order() {
        let data = BlockData {
            transactions: Vec::new(),
            index: 3,
            metadata: None,
        };

        assert_eq!(data.to_json().unwrap(), r#"{"transactions":[],"index":3}"#);
    }

    #[test]
    fn test_new_block_keeps_payload() {
        let data = sample_data();
        let hash = hash_block("previous_hash", 7, &data).unwrap();

        let block = Block::new(data.clone(), 7, "previous_hash".to_string(), hash.clone());

        assert_eq!(block.index, 2);
        assert_eq!(block.nonce, 7);
        assert_eq!(block.previous_block_hash, "previous_hash");
        assert_eq!(block.data(), data);
        assert_eq!(block.calculate_hash().unwrap(), hash);
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.nonce, 100);
        assert_eq!(genesis.hash, "0");
        assert_eq!(genesis.previous_block_hash, "0");

        let mut restamped = genesis.clone();
        restamped.timestamp = Utc::now();
        assert!(restamped.is_genesis());

        let mut tampered = genesis;
        tampered.nonce = 101;
        assert!(!tampered.is_genesis());
    }

    #[test]
    fn test_wire_format() {
        let block = Block::genesis();
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["previousBlockHash"], "0");
        assert_eq!(json["timestamp"], 0);
        assert!(json.get("metadata").is_none());

        let decoded: Block = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, block);
    }
}
