use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Sender used by minted reward transactions (no source account)
pub const REWARD_SENDER: &str = "00";

/// Amount credited to a miner for each mined block
pub const MINING_REWARD: f64 = 12.5;

/// Represents a transfer between two accounts
///
/// Transactions are immutable once created. No balance or signature check
/// is performed anywhere in the ledger, so any numeric amount is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Amount being transferred
    pub amount: f64,

    /// Sender's account identifier
    pub sender: String,

    /// Recipient's account identifier
    pub recipient: String,

    /// Unique identifier for the transaction (dashless UUID)
    pub transaction_id: String,
}

impl Transaction {
    /// Creates a new transaction with a fresh identifier
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to transfer
    /// * `sender` - The sender's account identifier
    /// * `recipient` - The recipient's account identifier
    pub fn new(amount: f64, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Transaction {
            amount,
            sender: sender.into(),
            recipient: recipient.into(),
            transaction_id: new_identifier(),
        }
    }

    /// Creates a reward transaction crediting `recipient` with the mining reward
    pub fn new_reward(recipient: impl Into<String>) -> Self {
        Transaction::new(MINING_REWARD, REWARD_SENDER, recipient)
    }

    /// Checks if the transaction is a minted reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }

    /// Checks if the account takes part in this transaction
    pub fn involves(&self, account: &str) -> bool {
        self.sender == account || self.recipient == account
    }
}

/// Generates a dashless UUID, used for transaction ids and node identities
pub fn new_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new(10.5, "alice", "bob");

        assert_eq!(transaction.amount, 10.5);
        assert_eq!(transaction.sender, "alice");
        assert_eq!(transaction.recipient, "bob");
        assert_eq!(transaction.transaction_id.len(), 32);
        assert!(!transaction.transaction_id.contains('-'));
        assert!(!transaction.is_reward());
    }

    #[test]
    fn test_reward_transaction() {
        let transaction = Transaction::new_reward("miner");

        assert_eq!(transaction.sender, REWARD_SENDER);
        assert_eq!(transaction.recipient, "miner");
        assert_eq!(transaction.amount, MINING_REWARD);
        assert!(transaction.is_reward());
    }

    #[test]
    fn test_ids_are_unique() {
        let first = Transaction::new(1.0, "a", "b");
        let second = Transaction::new(1.0, "a", "b");

        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[test]
    fn test_wire_field_names() {
        let transaction = Transaction::new(-3.0, "a", "b");
        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(json["amount"], -3.0);
        assert_eq!(json["transactionId"], transaction.transaction_id.as_str());
        assert!(json.get("transaction_id").is_none());
    }
}
