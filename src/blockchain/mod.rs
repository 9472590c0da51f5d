// Blockchain module
//
// This module contains the ledger engine:
// - Block and transaction structures
// - Proof of work search
// - Transaction pool
// - Chain and block validation
// - Longest-chain consensus
// - Lookups by block hash, transaction id and address

pub mod block;
pub mod chain;
pub mod consensus;
pub mod error;
pub mod index;
pub mod pool;
pub mod pow;
pub mod transaction;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, MinedBlock};
pub use consensus::LedgerSnapshot;
pub use error::LedgerError;
pub use index::{AddressSummary, TransactionLookup};
pub use transaction::Transaction;
