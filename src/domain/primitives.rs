//! Domain primitives: TimeMs, Address, Symbol, Side, Direction, MarketKind.

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Create a TimeMs from a block time in whole seconds.
    pub fn from_secs(secs: i64) -> Self {
        TimeMs(secs.saturating_mul(1000))
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Wallet address (base58-encoded Solana public key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid wallet address: {0}")]
pub struct AddressParseError(pub String);

impl Address {
    /// Create an Address from a string without validation.
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    /// Parse and validate a base58 public key.
    pub fn parse(addr: &str) -> Result<Self, AddressParseError> {
        let trimmed = addr.trim();
        Pubkey::from_str(trimmed)
            .map(|key| Address(key.to_string()))
            .map_err(|_| AddressParseError(addr.to_string()))
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Market kind of a Deriverse instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Perp,
    Spot,
}

impl MarketKind {
    fn prefix(&self) -> &'static str {
        match self {
            MarketKind::Perp => "PERP",
            MarketKind::Spot => "SPOT",
        }
    }
}

/// Market symbol (e.g., "PERP-0", "SPOT-3").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a Symbol from a string.
    pub fn new(symbol: String) -> Self {
        Symbol(symbol)
    }

    /// Symbol for a known instrument id.
    pub fn for_instrument(kind: MarketKind, instrument_id: u32) -> Self {
        Symbol(format!("{}-{}", kind.prefix(), instrument_id))
    }

    /// Placeholder symbol for fills whose order placement was never observed.
    pub fn unknown(kind: MarketKind) -> Self {
        Symbol(format!("{}-UNK", kind.prefix()))
    }

    /// Get the symbol as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side as logged by the program: 0 = buy, 1 = sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (long).
    Buy,
    /// Sell side (short).
    Sell,
}

impl Side {
    /// Decode the raw side flag. Values other than 0/1 are rejected.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Direction of a position held on this side.
    pub fn direction(&self) -> Direction {
        match self {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Trade direction as stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_flag() {
        assert_eq!(Side::from_flag(0), Some(Side::Buy));
        assert_eq!(Side::from_flag(1), Some(Side::Sell));
        assert_eq!(Side::from_flag(2), None);
    }

    #[test]
    fn test_side_opposite_and_direction() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Buy.direction(), Direction::Long);
        assert_eq!(Side::Sell.direction(), Direction::Short);
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&Direction::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
        assert_eq!("SHORT".parse::<Direction>().unwrap(), Direction::Short);
        assert!("short".parse::<Direction>().is_err());
    }

    #[test]
    fn test_symbol_naming() {
        assert_eq!(Symbol::for_instrument(MarketKind::Perp, 7).as_str(), "PERP-7");
        assert_eq!(Symbol::for_instrument(MarketKind::Spot, 0).as_str(), "SPOT-0");
        assert_eq!(Symbol::unknown(MarketKind::Perp).as_str(), "PERP-UNK");
        assert_eq!(Symbol::unknown(MarketKind::Spot).as_str(), "SPOT-UNK");
    }

    #[test]
    fn test_address_parse() {
        let key = Pubkey::new_from_array([9u8; 32]).to_string();
        let addr = Address::parse(&format!("  {}  ", key)).unwrap();
        assert_eq!(addr.as_str(), key);

        assert!(Address::parse("not-a-wallet").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_timems_from_secs() {
        assert_eq!(TimeMs::from_secs(1_700_000_000).as_ms(), 1_700_000_000_000);
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }
}
