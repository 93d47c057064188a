use crate::db::{CloseInPlace, CloseProgress, NewTrade, Repository, TradeQuery};
use crate::domain::{Address, Decimal, DerivedTrade, PersistedTrade, TimeMs};
use crate::engine::{LotKey, OpenLots};
use serde::Serialize;
use std::sync::Arc;

/// Size tolerance when comparing an open lot with a close, 1e-9.
pub fn size_epsilon() -> Decimal {
    Decimal::from_fixed(1, 9)
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    /// Row writes performed (inserts, updates and deletes).
    pub mutated: usize,
    pub closes_settled: usize,
    pub closes_matched: usize,
    pub closes_unmatched: usize,
    pub opens_written: usize,
    pub opens_kept: usize,
    pub cleanup_failures: usize,
}

/// Merges a wallet's freshly derived trades into the ledger, consuming
/// stored open lots first-in first-out.
#[derive(Clone)]
pub struct Reconciler {
    repo: Arc<Repository>,
}

impl Reconciler {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Apply one derived batch. Each write stands on its own; a failing
    /// write aborts the pass without undoing earlier ones.
    pub async fn reconcile(
        &self,
        wallet: &Address,
        trades: Vec<DerivedTrade>,
        now: TimeMs,
    ) -> Result<ReconcileOutcome, sqlx::Error> {
        let (opens, mut closes): (Vec<DerivedTrade>, Vec<DerivedTrade>) =
            trades.into_iter().partition(|t| t.is_open());
        closes.sort_by_key(|t| t.timestamp);

        let stored_open = self.repo.query_trades(wallet, &TradeQuery::open()).await?;
        let mut lots = OpenLots::from_trades(stored_open);
        tracing::debug!(
            wallet = %wallet,
            open_lots = lots.total_lots(),
            derived_open = opens.len(),
            derived_closed = closes.len(),
            "Reconciling derived trades"
        );

        let mut outcome = ReconcileOutcome::default();

        for close in &closes {
            self.apply_close(wallet, &mut lots, close, &mut outcome)
                .await?;
        }

        for open in &opens {
            let result = self
                .repo
                .refresh_open_trade(wallet, &NewTrade::from_derived(open))
                .await?;
            if result.is_write() {
                outcome.opens_written += 1;
                outcome.mutated += 1;
            } else {
                outcome.opens_kept += 1;
            }
        }

        self.repo.touch_last_synced(wallet, now).await?;

        tracing::info!(
            wallet = %wallet,
            mutated = outcome.mutated,
            closes_matched = outcome.closes_matched,
            closes_unmatched = outcome.closes_unmatched,
            closes_settled = outcome.closes_settled,
            opens_written = outcome.opens_written,
            "Reconciliation complete"
        );

        Ok(outcome)
    }

    async fn apply_close(
        &self,
        wallet: &Address,
        lots: &mut OpenLots,
        close: &DerivedTrade,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), sqlx::Error> {
        let (mut remaining, mut remaining_pnl, resumed) =
            match self.repo.close_progress(wallet, &close.id).await? {
                CloseProgress::Settled => {
                    outcome.closes_settled += 1;
                    return Ok(());
                }
                CloseProgress::Remainder { size, pnl } => (size, pnl, true),
                CloseProgress::Unallocated => (close.size, close.pnl, false),
            };

        let key = LotKey::new(close.symbol.clone(), close.direction);
        if lots.head(&key).is_none() {
            outcome.closes_unmatched += 1;
            if !resumed {
                // Left unmatched so a later pass can pair it once its open lot is stored.
                if self
                    .repo
                    .upsert_trade(wallet, &NewTrade::from_derived(close))
                    .await?
                {
                    outcome.mutated += 1;
                }
            }
            return Ok(());
        }

        let epsilon = size_epsilon();
        outcome.closes_matched += 1;

        // Oldest lot first; each lot smaller than what is left closes whole.
        while let Some(head) = lots.head(&key).cloned() {
            if head.size.approx_eq(remaining, epsilon) {
                let update = close_update(close, &head, remaining_pnl);
                if self.repo.close_in_place(wallet, &head.id, &update).await? {
                    outcome.mutated += 1;
                }
                lots.pop(&key);
                self.remove_duplicate(wallet, &head, close, outcome).await;
                return Ok(());
            }

            if head.size > remaining {
                let left_open = head.size - remaining;
                if self
                    .repo
                    .shrink_open_trade(wallet, &head.id, left_open)
                    .await?
                {
                    outcome.mutated += 1;
                }
                lots.shrink_head(&key, left_open);

                let mut record = NewTrade::from_derived(close).matched_to(&head.id);
                record.size = remaining;
                record.pnl = remaining_pnl;
                record.entry_timestamp = head.entry_timestamp.or(close.entry_timestamp);
                if self.repo.upsert_trade(wallet, &record).await? {
                    outcome.mutated += 1;
                }
                return Ok(());
            }

            let head_pnl = prorate(remaining_pnl, head.size, remaining);
            let update = close_update(close, &head, head_pnl);
            if self.repo.close_in_place(wallet, &head.id, &update).await? {
                outcome.mutated += 1;
            }
            lots.pop(&key);
            remaining = remaining - head.size;
            remaining_pnl = remaining_pnl.map(|p| p - head_pnl.unwrap_or_else(Decimal::zero));
        }

        // Lots ran out. The rest stays unmatched under the close's id until
        // a later pass finds another lot for it.
        let mut record = NewTrade::from_derived(close);
        record.size = remaining;
        record.pnl = remaining_pnl;
        if self.repo.upsert_trade(wallet, &record).await? {
            outcome.mutated += 1;
        }

        Ok(())
    }

    /// Drop a row stored under the close's own id by an earlier unmatched
    /// insert. If that fails (e.g. annotations reference it) the row is
    /// pinned to the head instead so later passes treat the close as settled.
    async fn remove_duplicate(
        &self,
        wallet: &Address,
        head: &PersistedTrade,
        close: &DerivedTrade,
        outcome: &mut ReconcileOutcome,
    ) {
        if head.id == close.id {
            return;
        }
        match self.repo.delete_trade(wallet, &close.id).await {
            Ok(true) => outcome.mutated += 1,
            Ok(false) => {}
            Err(e) => {
                outcome.cleanup_failures += 1;
                tracing::warn!(
                    wallet = %wallet,
                    trade_id = %close.id,
                    error = %e,
                    "Failed to delete duplicate closed trade, keeping it"
                );
                match self.repo.mark_matched(wallet, &close.id, &head.id).await {
                    Ok(true) => outcome.mutated += 1,
                    Ok(false) => {}
                    Err(e) => tracing::warn!(
                        wallet = %wallet,
                        trade_id = %close.id,
                        error = %e,
                        "Failed to pin duplicate closed trade"
                    ),
                }
            }
        }
    }
}

fn close_update(close: &DerivedTrade, head: &PersistedTrade, pnl: Option<Decimal>) -> CloseInPlace {
    CloseInPlace {
        closed_by: close.id.clone(),
        timestamp: close.timestamp,
        exit_price: close.exit_price,
        pnl,
        entry_timestamp: close.entry_timestamp.or(head.entry_timestamp),
    }
}

/// `pnl × part / whole`, or `None` when there is no pnl.
fn prorate(pnl: Option<Decimal>, part: Decimal, whole: Decimal) -> Option<Decimal> {
    pnl.map(|p| (p * part).checked_div(whole).unwrap_or_else(Decimal::zero))
}
