//! Trade records: derived from logs in one pass, and as persisted in the ledger.

use crate::domain::{Address, Decimal, Direction, Symbol, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "OPEN",
            TradeStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TradeStatus::Open),
            "CLOSED" => Ok(TradeStatus::Closed),
            other => Err(format!("unknown trade status: {}", other)),
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade computed fresh from program logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTrade {
    /// Transaction signature, suffixed `#<fill index>` for multi-fill transactions.
    pub id: String,
    pub timestamp: TimeMs,
    pub direction: Direction,
    pub symbol: Symbol,
    pub entry_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_timestamp: Option<TimeMs>,
}

impl DerivedTrade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }
}

/// A trade row in the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTrade {
    pub id: String,
    pub wallet: Address,
    pub timestamp: TimeMs,
    pub direction: Direction,
    pub symbol: Symbol,
    pub status: TradeStatus,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub fee: Decimal,
    pub pnl: Option<Decimal>,
    pub entry_timestamp: Option<TimeMs>,
    /// Id of the derived close that closed this row in place.
    pub closed_by: Option<String>,
    /// Id of the open row this closed row was matched against.
    pub matched_open: Option<String>,
}
