//! Trade queries and the mutations used by reconciliation.

use crate::domain::{
    Address, Decimal, DerivedTrade, Direction, PersistedTrade, Symbol, TimeMs, TradeStatus,
};
use sqlx::Row;

use super::{trade_from_row, Repository, TradeQuery};

/// Outcome of upserting a derived OPEN trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenUpsert {
    Inserted,
    Refreshed,
    Unchanged,
    /// The row was closed by an earlier reconciliation and stays closed.
    AlreadyClosed,
    /// The row has been partially closed; its stored size is authoritative.
    PartiallyClosed,
}

impl OpenUpsert {
    pub fn is_write(&self) -> bool {
        matches!(self, OpenUpsert::Inserted | OpenUpsert::Refreshed)
    }
}

/// A trade row to insert, or to overwrite on id conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    pub id: String,
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
    pub matched_open: Option<String>,
}

impl NewTrade {
    pub fn from_derived(trade: &DerivedTrade) -> Self {
        NewTrade {
            id: trade.id.clone(),
            timestamp: trade.timestamp,
            direction: trade.direction,
            symbol: trade.symbol.clone(),
            status: trade.status,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            size: trade.size,
            fee: trade.fee,
            pnl: trade.pnl,
            entry_timestamp: trade.entry_timestamp,
            matched_open: None,
        }
    }

    pub fn matched_to(mut self, open_id: &str) -> Self {
        self.matched_open = Some(open_id.to_string());
        self
    }
}

/// How far a derived close has been allocated against open lots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseProgress {
    Unallocated,
    /// Some lots were closed by it; the unmatched rest is stored under its own id.
    Remainder { size: Decimal, pnl: Option<Decimal> },
    Settled,
}

/// Fields written when an open row is closed where it stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInPlace {
    pub closed_by: String,
    pub timestamp: TimeMs,
    pub exit_price: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub entry_timestamp: Option<TimeMs>,
}

impl Repository {
    /// List a wallet's trades ordered by timestamp, then id.
    pub async fn query_trades(
        &self,
        wallet: &Address,
        filter: &TradeQuery,
    ) -> Result<Vec<PersistedTrade>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, wallet, timestamp_ms, direction, symbol, status, entry_price, exit_price,
                   size, fee, pnl, entry_timestamp_ms, closed_by, matched_open
            FROM trades
            WHERE wallet = ?
              AND (? IS NULL OR status = ?)
              AND (? IS NULL OR symbol = ?)
              AND (? IS NULL OR direction = ?)
            ORDER BY timestamp_ms ASC, id ASC
            "#,
        )
        .bind(wallet.as_str())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.symbol.as_ref().map(|s| s.as_str()))
        .bind(filter.symbol.as_ref().map(|s| s.as_str()))
        .bind(filter.direction.map(|d| d.as_str()))
        .bind(filter.direction.map(|d| d.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(trade_from_row).collect()
    }

    pub async fn get_trade(
        &self,
        wallet: &Address,
        id: &str,
    ) -> Result<Option<PersistedTrade>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, wallet, timestamp_ms, direction, symbol, status, entry_price, exit_price,
                   size, fee, pnl, entry_timestamp_ms, closed_by, matched_open
            FROM trades
            WHERE wallet = ? AND id = ?
            "#,
        )
        .bind(wallet.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(trade_from_row).transpose()
    }

    /// Insert a trade, or overwrite the mutable fields of the row with the same id.
    ///
    /// Entry price and fee are fixed at first insert. A `matched_open` of
    /// `None` keeps whatever match the row already carries.
    pub async fn upsert_trade(
        &self,
        wallet: &Address,
        trade: &NewTrade,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (
                id, wallet, timestamp_ms, direction, symbol, status, entry_price, exit_price,
                size, fee, pnl, entry_timestamp_ms, closed_by, matched_open, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                exit_price = excluded.exit_price,
                pnl = excluded.pnl,
                entry_timestamp_ms = excluded.entry_timestamp_ms,
                timestamp_ms = excluded.timestamp_ms,
                size = excluded.size,
                matched_open = COALESCE(excluded.matched_open, trades.matched_open)
            WHERE trades.wallet = excluded.wallet
            "#,
        )
        .bind(&trade.id)
        .bind(wallet.as_str())
        .bind(trade.timestamp.as_ms())
        .bind(trade.direction.as_str())
        .bind(trade.symbol.as_str())
        .bind(trade.status.as_str())
        .bind(trade.entry_price.to_canonical_string())
        .bind(trade.exit_price.map(|d| d.to_canonical_string()))
        .bind(trade.size.to_canonical_string())
        .bind(trade.fee.to_canonical_string())
        .bind(trade.pnl.map(|d| d.to_canonical_string()))
        .bind(trade.entry_timestamp.map(|t| t.as_ms()))
        .bind(trade.matched_open.as_deref())
        .bind(TimeMs::now().as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Upsert a derived OPEN trade without undoing earlier reconciliation.
    ///
    /// A CLOSED row is never reopened, and an open row that other rows were
    /// matched against keeps its reduced size.
    pub async fn refresh_open_trade(
        &self,
        wallet: &Address,
        trade: &NewTrade,
    ) -> Result<OpenUpsert, sqlx::Error> {
        let Some(existing) = self.get_trade(wallet, &trade.id).await? else {
            let written = self.upsert_trade(wallet, trade).await?;
            return Ok(if written {
                OpenUpsert::Inserted
            } else {
                OpenUpsert::Unchanged
            });
        };

        if existing.status == TradeStatus::Closed {
            return Ok(OpenUpsert::AlreadyClosed);
        }
        if self.has_partial_closes(wallet, &existing.id).await? {
            return Ok(OpenUpsert::PartiallyClosed);
        }

        let unchanged = existing.timestamp == trade.timestamp
            && existing.size == trade.size
            && existing.exit_price == trade.exit_price
            && existing.pnl == trade.pnl
            && existing.entry_timestamp == trade.entry_timestamp;
        if unchanged {
            return Ok(OpenUpsert::Unchanged);
        }

        let written = self.upsert_trade(wallet, trade).await?;
        Ok(if written {
            OpenUpsert::Refreshed
        } else {
            OpenUpsert::Unchanged
        })
    }

    /// Close an OPEN row where it stands. Size, entry price and fee are kept.
    pub async fn close_in_place(
        &self,
        wallet: &Address,
        id: &str,
        close: &CloseInPlace,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'CLOSED',
                exit_price = ?,
                pnl = ?,
                entry_timestamp_ms = ?,
                timestamp_ms = ?,
                closed_by = ?
            WHERE wallet = ? AND id = ? AND status = 'OPEN'
            "#,
        )
        .bind(close.exit_price.map(|d| d.to_canonical_string()))
        .bind(close.pnl.map(|d| d.to_canonical_string()))
        .bind(close.entry_timestamp.map(|t| t.as_ms()))
        .bind(close.timestamp.as_ms())
        .bind(&close.closed_by)
        .bind(wallet.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reduce the size of an OPEN row after a partial close.
    pub async fn shrink_open_trade(
        &self,
        wallet: &Address,
        id: &str,
        new_size: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE trades SET size = ? WHERE wallet = ? AND id = ? AND status = 'OPEN'",
        )
        .bind(new_size.to_canonical_string())
        .bind(wallet.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a trade row. Fails if annotations still reference it.
    pub async fn delete_trade(&self, wallet: &Address, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trades WHERE wallet = ? AND id = ?")
            .bind(wallet.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// How much of a derived close earlier syncs have already applied.
    pub async fn close_progress(
        &self,
        wallet: &Address,
        close_id: &str,
    ) -> Result<CloseProgress, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM trades WHERE wallet = ? AND closed_by = ?")
            .bind(wallet.as_str())
            .bind(close_id)
            .fetch_one(&self.pool)
            .await?;
        let closed_in_place = row.get::<i64, _>("n") > 0;
        let own = self.get_trade(wallet, close_id).await?;

        let progress = match own {
            Some(row) if row.status == TradeStatus::Closed && row.matched_open.is_some() => {
                CloseProgress::Settled
            }
            Some(row) if closed_in_place && row.status == TradeStatus::Closed => {
                CloseProgress::Remainder {
                    size: row.size,
                    pnl: row.pnl,
                }
            }
            _ if closed_in_place => CloseProgress::Settled,
            _ => CloseProgress::Unallocated,
        };
        Ok(progress)
    }

    /// Point a CLOSED row at the open lot it was paired with.
    pub async fn mark_matched(
        &self,
        wallet: &Address,
        id: &str,
        open_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET matched_open = ?
            WHERE wallet = ? AND id = ? AND status = 'CLOSED' AND matched_open IS NULL
            "#,
        )
        .bind(open_id)
        .bind(wallet.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any CLOSED row was matched against this open row.
    pub async fn has_partial_closes(
        &self,
        wallet: &Address,
        open_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM trades
            WHERE wallet = ? AND matched_open = ? AND status = 'CLOSED'
            "#,
        )
        .bind(wallet.as_str())
        .bind(open_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    /// Attach a note to a trade.
    pub async fn insert_annotation(
        &self,
        wallet: &Address,
        annotation_id: &str,
        trade_id: &str,
        note: &str,
        tags: Option<&str>,
        now: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO trade_annotations (id, trade_id, wallet, note, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(annotation_id)
        .bind(trade_id)
        .bind(wallet.as_str())
        .bind(note)
        .bind(tags)
        .bind(now.as_ms())
        .bind(now.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
