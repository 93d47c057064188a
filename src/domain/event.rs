//! Execution events decoded from Deriverse program logs.

use crate::domain::{Decimal, MarketKind, Side};
use serde::{Deserialize, Serialize};

/// An order placement; links an order id to its instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderEvent {
    pub kind: MarketKind,
    pub instrument_id: u32,
    pub order_id: i64,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub client_id: u32,
}

/// A fill of a previously placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub kind: MarketKind,
    pub order_id: i64,
    pub side: Side,
    /// Base-asset quantity.
    pub size: Decimal,
    /// Quote-currency amount exchanged.
    pub quote_amount: Decimal,
    pub price: Decimal,
    /// Maker rebate credited for this fill.
    pub rebate: Decimal,
    pub client_id: u32,
}

/// Fees charged within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    pub kind: MarketKind,
    pub amount: Decimal,
    pub ref_payment: Decimal,
    pub ref_client_id: u32,
}

/// All events decoded from one transaction, each list in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramEvents {
    pub place_orders: Vec<PlaceOrderEvent>,
    pub fills: Vec<FillEvent>,
    pub fees: Vec<FeeEvent>,
}

impl ProgramEvents {
    pub fn is_empty(&self) -> bool {
        self.place_orders.is_empty() && self.fills.is_empty() && self.fees.is_empty()
    }

    /// Sum of decoded fee amounts.
    pub fn total_fees(&self) -> Decimal {
        self.fees.iter().map(|f| f.amount).sum()
    }
}
