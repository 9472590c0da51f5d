use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::block::Block;
use super::transaction::Transaction;
use super::validation::validate_chain;

/// A peer's view of the ledger, as served by its chain endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// The peer's chain, genesis first
    pub chain: Vec<Block>,

    /// The peer's pending transactions
    #[serde(default)]
    pub pending_transactions: Vec<Transaction>,
}

/// Outcome of a fork-choice round
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
    /// True when a peer chain was adopted
    pub replaced: bool,
}

/// Selects the longest valid chain among the local one and the peers'
///
/// Peers are scanned in the order given and only a strictly longer chain
/// replaces the running candidate, so ties keep the earlier one. The
/// winning peer chain is validated once at the end; if it fails, the local
/// chain and pool are kept. Length is compared, not cumulative work.
///
/// # Arguments
///
/// * `local_chain` - The node's current chain
/// * `local_pool` - The node's pending transactions
/// * `peers` - Snapshots fetched from peers
pub fn resolve(
    local_chain: Vec<Block>,
    local_pool: Vec<Transaction>,
    peers: Vec<LedgerSnapshot>,
) -> Resolution {
    let mut max_len = local_chain.len();
    let mut winner: Option<LedgerSnapshot> = None;

    for snapshot in peers {
        if snapshot.chain.len() > max_len {
            debug!("Peer chain of length {} is the new candidate", snapshot.chain.len());
            max_len = snapshot.chain.len();
            winner = Some(snapshot);
        }
    }

    match winner {
        Some(candidate) => match validate_chain(&candidate.chain) {
            Ok(()) => {
                info!(
                    "Replacing local chain of length {} with peer chain of length {}",
                    local_chain.len(),
                    candidate.chain.len()
                );
                Resolution {
                    chain: candidate.chain,
                    pending_transactions: candidate.pending_transactions,
                    replaced: true,
                }
            }
            Err(err) => {
                warn!("Longest peer chain rejected: {}", err);
                Resolution {
                    chain: local_chain,
                    pending_transactions: local_pool,
                    replaced: false,
                }
            }
        },
        None => Resolution {
            chain: local_chain,
            pending_transactions: local_pool,
            replaced: false,
        },
    }
}
