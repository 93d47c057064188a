use crate::decode::parse_program_data_logs;
use crate::domain::{
    sort_transactions_chronological, Decimal, DerivedTrade, FillEvent, MarketKind, RawTransaction,
    Side, Symbol, TimeMs, TradeStatus,
};
use std::collections::HashMap;
use tracing::debug;

use super::position_book::{PositionBook, PositionKey};

/// Market an order id was placed on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderMarket {
    symbol: Symbol,
    kind: MarketKind,
}

/// Reconstructs opened and closed trades from a batch of transactions.
///
/// State (order id map and positions) lives for a single pass only.
pub struct TradeDeriver {
    fallback_time: TimeMs,
    orders: HashMap<i64, OrderMarket>,
    book: PositionBook,
    trades: Vec<DerivedTrade>,
}

impl TradeDeriver {
    /// `fallback_time` stamps transactions that carry no block time.
    pub fn new(fallback_time: TimeMs) -> Self {
        Self {
            fallback_time,
            orders: HashMap::new(),
            book: PositionBook::new(),
            trades: Vec::new(),
        }
    }

    /// Derive trades from an unordered batch of transactions.
    pub fn derive(txs: &[RawTransaction], fallback_time: TimeMs) -> Vec<DerivedTrade> {
        let mut deriver = Self::new(fallback_time);
        for tx in sort_transactions_chronological(txs) {
            deriver.process_transaction(tx);
        }
        deriver.into_trades()
    }

    /// Process one transaction. Callers must feed transactions in chronological order.
    pub fn process_transaction(&mut self, tx: &RawTransaction) {
        let timestamp = tx
            .block_time
            .map(TimeMs::from_secs)
            .unwrap_or(self.fallback_time);
        let events = parse_program_data_logs(&tx.log_messages);

        for po in &events.place_orders {
            self.orders.insert(
                po.order_id,
                OrderMarket {
                    symbol: Symbol::for_instrument(po.kind, po.instrument_id),
                    kind: po.kind,
                },
            );
        }

        let mut total_fee = events.total_fees();
        if !total_fee.is_positive() {
            total_fee = Decimal::from_lamports(tx.fee_lamports);
        }
        let fill_count = events.fills.len();
        let fee_per_fill = if fill_count > 0 {
            total_fee / Decimal::from(fill_count as u64)
        } else {
            Decimal::zero()
        };

        debug!(
            signature = %tx.signature,
            fills = fill_count,
            place_orders = events.place_orders.len(),
            fee_per_fill = %fee_per_fill,
            "Deriving trades from transaction"
        );

        for (index, fill) in events.fills.iter().enumerate() {
            let id = if fill_count > 1 {
                format!("{}#{}", tx.signature, index)
            } else {
                tx.signature.clone()
            };
            self.process_fill(id, fill, timestamp, fee_per_fill);
        }
    }

    /// Apply one fill to the book and emit the trade it produces.
    ///
    /// Fills with a size of zero or less are not emitted and leave the book
    /// untouched. They still took a share of the transaction fee, and that
    /// share (with any rebate on them) is not attributed to any trade.
    fn process_fill(&mut self, id: String, fill: &FillEvent, timestamp: TimeMs, fee: Decimal) {
        if !fill.size.is_positive() {
            debug!(id = %id, size = %fill.size, "Skipping fill with non-positive size");
            return;
        }

        let symbol = self.resolve_symbol(fill);
        let opposite = PositionKey::new(symbol.clone(), fill.side.opposite());

        match self.book.reduce(&opposite, fill.size) {
            Some(reduction) => {
                let gross = match opposite.side {
                    Side::Buy => (fill.price - reduction.avg_entry) * reduction.closed,
                    Side::Sell => (reduction.avg_entry - fill.price) * reduction.closed,
                };
                let pnl = gross - fee + fill.rebate;

                self.trades.push(DerivedTrade {
                    id,
                    timestamp,
                    direction: opposite.side.direction(),
                    symbol: symbol.clone(),
                    entry_price: reduction.avg_entry,
                    exit_price: Some(fill.price),
                    size: reduction.closed,
                    fee,
                    pnl: Some(pnl),
                    status: TradeStatus::Closed,
                    entry_timestamp: Some(reduction.opened_at),
                });

                let remainder = fill.size - reduction.closed;
                if remainder.is_positive() {
                    self.book.add(
                        PositionKey::new(symbol, fill.side),
                        remainder,
                        fill.price,
                        timestamp,
                    );
                }
            }
            None => {
                self.trades.push(DerivedTrade {
                    id,
                    timestamp,
                    direction: fill.side.direction(),
                    symbol: symbol.clone(),
                    entry_price: fill.price,
                    exit_price: None,
                    size: fill.size,
                    fee,
                    pnl: None,
                    status: TradeStatus::Open,
                    entry_timestamp: None,
                });
                self.book.add(
                    PositionKey::new(symbol, fill.side),
                    fill.size,
                    fill.price,
                    timestamp,
                );
            }
        }
    }

    fn resolve_symbol(&self, fill: &FillEvent) -> Symbol {
        match self.orders.get(&fill.order_id) {
            Some(market) => {
                if market.kind != fill.kind {
                    debug!(
                        order_id = fill.order_id,
                        "Fill market kind differs from its placed order"
                    );
                }
                market.symbol.clone()
            }
            None => Symbol::unknown(fill.kind),
        }
    }

    /// Get the accumulated trades in emission order.
    pub fn into_trades(self) -> Vec<DerivedTrade> {
        self.trades
    }
}
