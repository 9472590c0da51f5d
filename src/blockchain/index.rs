use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::block::Block;
use super::transaction::Transaction;

/// A confirmed transaction together with the block holding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionLookup {
    pub transaction: Transaction,
    pub block: Block,
}

/// Every confirmed transaction touching an account and its net balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub address_transactions: Vec<Transaction>,
    pub address_balance: f64,
}

/// Finds a block by its hash
pub fn find_block<'a>(chain: &'a [Block], hash: &str) -> Option<&'a Block> {
    chain.iter().find(|block| block.hash == hash)
}

/// Finds a confirmed transaction by id
///
/// Only the chain is searched: a pending transaction is not found.
pub fn find_transaction(chain: &[Block], id: &str) -> Option<TransactionLookup> {
    chain.iter().find_map(|block| {
        block
            .transactions
            .iter()
            .find(|tx| tx.transaction_id == id)
            .map(|tx| TransactionLookup {
                transaction: tx.clone(),
                block: block.clone(),
            })
    })
}

/// Collects an account's confirmed transactions and derives its balance
///
/// The balance is what the account received minus what it sent. A
/// transfer from an account to itself nets to zero.
pub fn address_summary(chain: &[Block], account: &str) -> AddressSummary {
    let address_transactions: Vec<Transaction> = chain
        .iter()
        .flat_map(|block| block.transactions.iter())
        .filter(|tx| tx.involves(account))
        .cloned()
        .collect();

    let address_balance = address_transactions.iter().fold(0.0, |mut balance, tx| {
        if tx.recipient == account {
            balance += tx.amount;
        }
        if tx.sender == account {
            balance -= tx.amount;
        }
        balance
    });

    AddressSummary {
        address_transactions,
        address_balance,
    }
}
