//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by table:
//! - `wallets.rs` - Wallet registration and sync bookkeeping
//! - `trades.rs` - Trade queries and reconciliation mutations

mod trades;
mod wallets;

use crate::domain::{Address, Decimal, Direction, PersistedTrade, Symbol, TimeMs, TradeStatus};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

pub use trades::{CloseInPlace, CloseProgress, NewTrade, OpenUpsert};
pub use wallets::WalletRecord;

/// Optional filters for trade listing. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeQuery {
    pub status: Option<TradeStatus>,
    pub symbol: Option<Symbol>,
    pub direction: Option<Direction>,
}

impl TradeQuery {
    pub fn open() -> Self {
        TradeQuery {
            status: Some(TradeStatus::Open),
            ..Default::default()
        }
    }
}

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap connectivity probe used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

fn parse_optional_column<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        T::from_str(&s).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: e.into(),
        })
    })
    .transpose()
}

/// Map a `trades` row into the domain record. Decimal text that fails to
/// parse is surfaced as a decode error rather than silently zeroed.
pub(crate) fn trade_from_row(row: &SqliteRow) -> Result<PersistedTrade, sqlx::Error> {
    let wallet: String = row.try_get("wallet")?;
    let symbol: String = row.try_get("symbol")?;
    let timestamp_ms: i64 = row.try_get("timestamp_ms")?;
    let entry_timestamp_ms: Option<i64> = row.try_get("entry_timestamp_ms")?;

    Ok(PersistedTrade {
        id: row.try_get("id")?,
        wallet: Address::new(wallet),
        timestamp: TimeMs::new(timestamp_ms),
        direction: parse_column::<Direction>(row, "direction")?,
        symbol: Symbol::new(symbol),
        status: parse_column::<TradeStatus>(row, "status")?,
        entry_price: parse_column::<Decimal>(row, "entry_price")?,
        exit_price: parse_optional_column::<Decimal>(row, "exit_price")?,
        size: parse_column::<Decimal>(row, "size")?,
        fee: parse_column::<Decimal>(row, "fee")?,
        pnl: parse_optional_column::<Decimal>(row, "pnl")?,
        entry_timestamp: entry_timestamp_ms.map(TimeMs::new),
        closed_by: row.try_get("closed_by")?,
        matched_open: row.try_get("matched_open")?,
    })
}
