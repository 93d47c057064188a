//! Wallet registration and sync bookkeeping.

use crate::domain::{Address, TimeMs};
use sqlx::Row;

use super::Repository;

/// A registered wallet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub address: Address,
    pub created_at: TimeMs,
    pub last_synced_at: Option<TimeMs>,
}

impl Repository {
    /// Register a wallet if it is not known yet.
    ///
    /// Returns true when a new row was created.
    pub async fn ensure_wallet(&self, wallet: &Address, now: TimeMs) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO wallets (address, created_at, last_synced_at)
            VALUES (?, ?, NULL)
            ON CONFLICT(address) DO NOTHING
            "#,
        )
        .bind(wallet.as_str())
        .bind(now.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the completion time of a sync.
    pub async fn touch_last_synced(&self, wallet: &Address, at: TimeMs) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE wallets SET last_synced_at = ? WHERE address = ?")
            .bind(at.as_ms())
            .bind(wallet.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_wallet(&self, wallet: &Address) -> Result<Option<WalletRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT address, created_at, last_synced_at FROM wallets WHERE address = ?",
        )
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| WalletRecord {
            address: Address::new(r.get("address")),
            created_at: TimeMs::new(r.get("created_at")),
            last_synced_at: r.get::<Option<i64>, _>("last_synced_at").map(TimeMs::new),
        }))
    }
}
