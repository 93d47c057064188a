//! FIFO queues of persisted open trades, one per (symbol, direction).

use crate::domain::{Decimal, Direction, PersistedTrade, Symbol};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LotKey {
    pub symbol: Symbol,
    pub direction: Direction,
}

impl LotKey {
    pub fn new(symbol: Symbol, direction: Direction) -> Self {
        LotKey { symbol, direction }
    }
}

/// Open lots in the order they must be consumed.
///
/// Input rows are expected in ledger order (timestamp, then id); each queue
/// keeps that order.
#[derive(Debug, Default)]
pub struct OpenLots {
    queues: HashMap<LotKey, VecDeque<PersistedTrade>>,
}

impl OpenLots {
    pub fn from_trades(trades: impl IntoIterator<Item = PersistedTrade>) -> Self {
        let mut queues: HashMap<LotKey, VecDeque<PersistedTrade>> = HashMap::new();
        for trade in trades {
            let key = LotKey::new(trade.symbol.clone(), trade.direction);
            queues.entry(key).or_default().push_back(trade);
        }
        OpenLots { queues }
    }

    pub fn head(&self, key: &LotKey) -> Option<&PersistedTrade> {
        self.queues.get(key).and_then(|q| q.front())
    }

    /// Remove the oldest lot; empty queues are dropped.
    pub fn pop(&mut self, key: &LotKey) -> Option<PersistedTrade> {
        let queue = self.queues.get_mut(key)?;
        let head = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(key);
        }
        head
    }

    /// Set the size of the oldest lot after a partial close.
    pub fn shrink_head(&mut self, key: &LotKey, new_size: Decimal) {
        if let Some(head) = self.queues.get_mut(key).and_then(|q| q.front_mut()) {
            head.size = new_size;
        }
    }

    pub fn len(&self, key: &LotKey) -> usize {
        self.queues.get(key).map_or(0, |q| q.len())
    }

    pub fn total_lots(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, TimeMs, TradeStatus};

    fn lot(id: &str, symbol: &str, direction: Direction, size: &str) -> PersistedTrade {
        PersistedTrade {
            id: id.to_string(),
            wallet: Address::new("w".to_string()),
            timestamp: TimeMs::new(0),
            direction,
            symbol: Symbol::new(symbol.to_string()),
            status: TradeStatus::Open,
            entry_price: Decimal::from_str_canonical("1").unwrap(),
            exit_price: None,
            size: Decimal::from_str_canonical(size).unwrap(),
            fee: Decimal::zero(),
            pnl: None,
            entry_timestamp: None,
            closed_by: None,
            matched_open: None,
        }
    }

    #[test]
    fn test_queues_are_fifo_per_key() {
        let mut lots = OpenLots::from_trades(vec![
            lot("a", "PERP-0", Direction::Long, "2"),
            lot("x", "PERP-0", Direction::Short, "1"),
            lot("b", "PERP-0", Direction::Long, "3"),
        ]);
        let long = LotKey::new(Symbol::new("PERP-0".to_string()), Direction::Long);

        assert_eq!(lots.total_lots(), 3);
        assert_eq!(lots.len(&long), 2);
        assert_eq!(lots.head(&long).unwrap().id, "a");
        assert_eq!(lots.pop(&long).unwrap().id, "a");
        assert_eq!(lots.head(&long).unwrap().id, "b");
        assert_eq!(lots.pop(&long).unwrap().id, "b");
        assert!(lots.head(&long).is_none());
        assert!(lots.pop(&long).is_none());
        assert_eq!(lots.total_lots(), 1);
    }

    #[test]
    fn test_shrink_head() {
        let key = LotKey::new(Symbol::new("SPOT-1".to_string()), Direction::Short);
        let mut lots = OpenLots::from_trades(vec![lot("a", "SPOT-1", Direction::Short, "5")]);
        lots.shrink_head(&key, Decimal::from_str_canonical("3").unwrap());
        assert_eq!(
            lots.head(&key).unwrap().size,
            Decimal::from_str_canonical("3").unwrap()
        );
    }
}
