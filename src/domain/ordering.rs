//! Stable transaction ordering for deterministic derivation.

use crate::domain::RawTransaction;

/// Ordering key for transactions within one derivation pass.
///
/// Ordering: block time (missing = 0) -> arrival index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransactionOrderingKey {
    /// Block time in seconds (primary sort).
    pub block_time: i64,
    /// Position in the fetched batch (tie-breaker).
    pub arrival: usize,
}

impl TransactionOrderingKey {
    pub fn new(tx: &RawTransaction, arrival: usize) -> Self {
        TransactionOrderingKey {
            block_time: tx.block_time.unwrap_or(0),
            arrival,
        }
    }
}

/// Return the transactions in chronological order, ties kept in arrival order.
pub fn sort_transactions_chronological(txs: &[RawTransaction]) -> Vec<&RawTransaction> {
    let mut keyed: Vec<(TransactionOrderingKey, &RawTransaction)> = txs
        .iter()
        .enumerate()
        .map(|(arrival, tx)| (TransactionOrderingKey::new(tx, arrival), tx))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, tx)| tx).collect()
}
