//! Domain types for the Deriverse trade ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Address, Symbol, Side, Direction, MarketKind
//! - Decoded program events and raw upstream transactions
//! - Derived and persisted trade records
//! - Stable transaction ordering for deterministic derivation

pub mod decimal;
pub mod event;
pub mod ordering;
pub mod primitives;
pub mod trade;
pub mod transaction;

pub use decimal::Decimal;
pub use event::{FeeEvent, FillEvent, PlaceOrderEvent, ProgramEvents};
pub use ordering::{sort_transactions_chronological, TransactionOrderingKey};
pub use primitives::{Address, AddressParseError, Direction, MarketKind, Side, Symbol, TimeMs};
pub use trade::{DerivedTrade, PersistedTrade, TradeStatus};
pub use transaction::{CompiledInstruction, RawTransaction};
