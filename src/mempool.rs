//! Staging area for transactions awaiting inclusion in a block.
//!
//! The pool keeps insertion order; mining drains it front to back.

use crate::error::ChainError;
use crate::transaction::Transaction;
use std::collections::HashSet;

/// Maximum number of staged transactions.
pub const MAX_POOL_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
    capacity: usize,
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::with_capacity(MAX_POOL_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TransactionPool {
            transactions: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stage a transaction. Duplicates are checked before capacity.
    pub fn add(&mut self, tx: Transaction) -> Result<(), ChainError> {
        if self.transactions.iter().any(|t| t.id == tx.id) {
            return Err(ChainError::DuplicateTransaction(tx.id));
        }
        if self.transactions.len() >= self.capacity {
            return Err(ChainError::PoolFull(self.capacity));
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Snapshot of up to `limit` transactions in insertion order.
    pub fn list(&self, limit: Option<usize>) -> Vec<Transaction> {
        match limit {
            Some(n) => self.transactions.iter().take(n).cloned().collect(),
            None => self.transactions.clone(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Remove every transaction whose id is in `ids`; survivors keep their order.
    /// Returns how many were removed.
    pub fn remove(&mut self, ids: &[String]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = self.transactions.len();
        self.transactions.retain(|t| !ids.contains(t.id.as_str()));
        before - self.transactions.len()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    /// Take every staged transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransferRequest;

    fn tx(amount: i64) -> Transaction {
        Transaction::admit(TransferRequest::new("alice", "bob", amount))
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut pool = TransactionPool::new();
        let txs: Vec<_> = (1..=3).map(tx).collect();
        for t in &txs {
            pool.add(t.clone()).unwrap();
        }
        assert_eq!(pool.list(None), txs);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut pool = TransactionPool::new();
        let t = tx(1);
        pool.add(t.clone()).unwrap();
        assert_eq!(
            pool.add(t.clone()),
            Err(ChainError::DuplicateTransaction(t.id))
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_full() {
        let mut pool = TransactionPool::new();
        for _ in 0..MAX_POOL_SIZE {
            pool.add(tx(1)).unwrap();
        }
        assert_eq!(pool.add(tx(1)), Err(ChainError::PoolFull(MAX_POOL_SIZE)));
        assert_eq!(pool.len(), MAX_POOL_SIZE);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut pool = TransactionPool::new();
        pool.add(tx(1)).unwrap();
        pool.add(tx(2)).unwrap();

        let snapshot = pool.list(Some(1));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].amount, 1);

        pool.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_keeps_survivor_order() {
        let mut pool = TransactionPool::new();
        let txs: Vec<_> = (1..=5).map(tx).collect();
        for t in &txs {
            pool.add(t.clone()).unwrap();
        }

        let removed = pool.remove(&[txs[1].id.clone(), txs[3].id.clone(), "missing".into()]);
        assert_eq!(removed, 2);
        let amounts: Vec<_> = pool.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1, 3, 5]);
    }

    #[test]
    fn test_get_and_drain() {
        let mut pool = TransactionPool::with_capacity(2);
        let t = tx(7);
        pool.add(t.clone()).unwrap();
        assert_eq!(pool.get(&t.id), Some(&t));
        assert!(pool.get("nope").is_none());

        let drained = pool.drain();
        assert_eq!(drained, vec![t]);
        assert!(pool.is_empty());
    }
}
