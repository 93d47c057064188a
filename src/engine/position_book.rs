use crate::domain::{Decimal, Side, Symbol, TimeMs};
use std::collections::HashMap;

/// Composite key of a position within one derivation pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub symbol: Symbol,
    pub side: Side,
}

impl PositionKey {
    pub fn new(symbol: Symbol, side: Side) -> Self {
        Self { symbol, side }
    }
}

/// Open exposure for one (symbol, side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub size: Decimal,
    /// Sum of price * size over the open quantity.
    pub total_cost: Decimal,
    pub opened_at: TimeMs,
}

impl Position {
    /// Weighted average entry price.
    pub fn avg_entry(&self) -> Decimal {
        self.total_cost / self.size
    }
}

/// Result of reducing a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub closed: Decimal,
    pub avg_entry: Decimal,
    pub opened_at: TimeMs,
}

/// Positions keyed by (symbol, side). Entries always hold size > 0.
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: HashMap<PositionKey, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Open or extend the position at `key`.
    pub fn add(&mut self, key: PositionKey, size: Decimal, price: Decimal, at: TimeMs) {
        if !size.is_positive() {
            return;
        }
        self.positions
            .entry(key)
            .and_modify(|p| {
                p.size = p.size + size;
                p.total_cost = p.total_cost + price * size;
            })
            .or_insert(Position {
                size,
                total_cost: price * size,
                opened_at: at,
            });
    }

    /// Close up to `size` of the position at `key`, shrinking its cost pro-rata.
    ///
    /// Returns None when no position is held at `key`. The entry is removed
    /// once its size reaches zero.
    pub fn reduce(&mut self, key: &PositionKey, size: Decimal) -> Option<Reduction> {
        let position = self.positions.get_mut(key)?;
        let old_size = position.size;
        let closed = size.min(old_size);
        let reduction = Reduction {
            closed,
            avg_entry: position.avg_entry(),
            opened_at: position.opened_at,
        };

        position.size = old_size - closed;
        position.total_cost = position.total_cost - position.total_cost * (closed / old_size);
        if !position.size.is_positive() {
            self.positions.remove(key);
        }

        Some(reduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn key(side: Side) -> PositionKey {
        PositionKey::new(Symbol::new("PERP-0".to_string()), side)
    }

    #[test]
    fn test_add_accumulates_cost() {
        let mut book = PositionBook::new();
        book.add(key(Side::Buy), d("1"), d("100"), TimeMs::new(1));
        book.add(key(Side::Buy), d("3"), d("120"), TimeMs::new(2));

        let p = book.get(&key(Side::Buy)).unwrap();
        assert_eq!(p.size, d("4"));
        assert_eq!(p.total_cost, d("460"));
        assert_eq!(p.avg_entry(), d("115"));
        assert_eq!(p.opened_at, TimeMs::new(1));
    }

    #[test]
    fn test_reduce_is_pro_rata_and_removes_at_zero() {
        let mut book = PositionBook::new();
        book.add(key(Side::Sell), d("4"), d("50"), TimeMs::new(1));

        let r = book.reduce(&key(Side::Sell), d("1")).unwrap();
        assert_eq!(r.closed, d("1"));
        assert_eq!(r.avg_entry, d("50"));
        assert_eq!(book.get(&key(Side::Sell)).unwrap().total_cost, d("150"));

        let r = book.reduce(&key(Side::Sell), d("10")).unwrap();
        assert_eq!(r.closed, d("3"));
        assert!(book.get(&key(Side::Sell)).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_reduce_missing_key() {
        let mut book = PositionBook::new();
        assert!(book.reduce(&key(Side::Buy), d("1")).is_none());
    }

    #[test]
    fn test_add_ignores_non_positive_size() {
        let mut book = PositionBook::new();
        book.add(key(Side::Buy), Decimal::zero(), d("100"), TimeMs::new(1));
        assert!(book.is_empty());
    }
}
