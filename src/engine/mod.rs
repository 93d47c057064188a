//! Pure computation engine(s) for deterministic ledger logic.

pub mod open_lots;
pub mod position_book;
pub mod program_filter;
pub mod trade_deriver;

pub use open_lots::{LotKey, OpenLots};
pub use position_book::{Position, PositionBook, PositionKey};
pub use program_filter::ProgramFilter;
pub use trade_deriver::TradeDeriver;
