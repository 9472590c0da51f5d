use std::collections::HashSet;

use super::transaction::Transaction;

/// Pending transactions waiting to be included in a block
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool holding the given transactions in order
    ///
    /// Repeated ids keep their first occurrence.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let mut pool = TransactionPool::new();
        for transaction in transactions {
            pool.add(transaction);
        }
        pool
    }

    /// Appends a transaction to the pool
    ///
    /// # Returns
    ///
    /// false if a transaction with the same id is already pending
    pub fn add(&mut self, transaction: Transaction) -> bool {
        if self.contains(&transaction.transaction_id) {
            return false;
        }
        self.transactions.push(transaction);
        true
    }

    /// Checks if a transaction id is pending
    pub fn contains(&self, transaction_id: &str) -> bool {
        self.transactions
            .iter()
            .any(|tx| tx.transaction_id == transaction_id)
    }

    /// Returns all pending transactions and empties the pool
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Returns a copy of the pending transactions
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Removes the given transactions, keeping anything submitted since
    pub fn remove_included(&mut self, included: &[Transaction]) {
        let ids: HashSet<&str> = included.iter().map(|tx| tx.transaction_id.as_str()).collect();
        self.transactions
            .retain(|tx| !ids.contains(tx.transaction_id.as_str()));
    }

    /// Checks if a reward transaction is waiting in the pool
    pub fn has_reward(&self) -> bool {
        self.transactions.iter().any(Transaction::is_reward)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_snapshot() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(1.0, "a", "b"));
        pool.add(Transaction::new(2.0, "b", "c"));

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].amount, 1.0);
        assert_eq!(snapshot[1].amount, 2.0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_drain_empties_pool() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(1.0, "a", "b"));

        let drained = pool.drain();
        assert_eq!(drained.len(), 1);
        assert!(pool.is_empty());
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn test_remove_included_keeps_late_arrivals() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(1.0, "a", "b"));
        let included = pool.snapshot();
        let late = Transaction::new(5.0, "c", "d");
        pool.add(late.clone());

        pool.remove_included(&included);
        assert_eq!(pool.snapshot(), vec![late]);
    }

    #[test]
    fn test_same_id_is_pooled_once() {
        let mut pool = TransactionPool::new();
        let tx = Transaction::new(1.0, "a", "b");

        assert!(pool.add(tx.clone()));
        assert!(!pool.add(tx.clone()));
        assert!(pool.contains(&tx.transaction_id));
        assert_eq!(pool.snapshot(), vec![tx.clone()]);

        let other = Transaction::new(2.0, "b", "c");
        let rebuilt = TransactionPool::from_transactions(vec![tx.clone(), other.clone(), tx.clone()]);
        assert_eq!(rebuilt.snapshot(), vec![tx, other]);
    }

    #[test]
    fn test_has_reward() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(1.0, "a", "b"));
        assert!(!pool.has_reward());

        pool.add(Transaction::new_reward("miner"));
        assert!(pool.has_reward());
    }

    #[test]
    fn test_any_amount_is_accepted() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(-1e9, "a", "b"));
        pool.add(Transaction::new(0.0, "a", "a"));

        assert_eq!(pool.len(), 2);
    }
}
