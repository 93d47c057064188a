use crate::db::Repository;
use crate::domain::{Address, AddressParseError, TimeMs};
use crate::engine::TradeDeriver;
use crate::orchestration::ingest::{IngestionError, Ingestor};
use crate::orchestration::reconcile::{ReconcileOutcome, Reconciler};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Result of one wallet sync as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub mutated_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    fn ok(mutated_count: usize) -> Self {
        Self {
            success: true,
            mutated_count,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            mutated_count: 0,
            error: Some(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressParseError),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Entry point for syncing a wallet's trade ledger.
///
/// Syncs of the same wallet are serialized; different wallets run concurrently.
#[derive(Clone)]
pub struct TradeSyncService {
    ingestor: Ingestor,
    reconciler: Reconciler,
    repo: Arc<Repository>,
    wallet_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl TradeSyncService {
    pub fn new(ingestor: Ingestor, repo: Arc<Repository>) -> Self {
        Self {
            ingestor,
            reconciler: Reconciler::new(repo.clone()),
            repo,
            wallet_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn sync_wallet(&self, address: &str) -> SyncResult {
        match self.try_sync(address).await {
            Ok(outcome) => SyncResult::ok(outcome.mutated),
            Err(e) => {
                tracing::error!(wallet = %address, error = %e, "Wallet sync failed");
                SyncResult::failed(e.to_string())
            }
        }
    }

    /// Run the full pipeline and return the reconciliation details.
    pub async fn try_sync(&self, address: &str) -> Result<ReconcileOutcome, SyncError> {
        let wallet = Address::parse(address)?;

        let lock = self.wallet_lock(&wallet);
        let result = {
            let _guard = lock.lock().await;
            self.sync_locked(&wallet).await
        };
        self.release_wallet_lock(&wallet, lock);
        result
    }

    async fn sync_locked(&self, wallet: &Address) -> Result<ReconcileOutcome, SyncError> {
        let started = TimeMs::now();
        self.repo.ensure_wallet(wallet, started).await?;

        let ingestion = self.ingestor.ingest(wallet).await?;
        let derived = TradeDeriver::derive(&ingestion.transactions, started);
        tracing::debug!(
            wallet = %wallet,
            derived = derived.len(),
            "Derived trades from program logs"
        );

        let outcome = self
            .reconciler
            .reconcile(wallet, derived, TimeMs::now())
            .await?;
        Ok(outcome)
    }

    fn wallet_lock(&self, wallet: &Address) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .wallet_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(wallet.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Forget a wallet's lock once no other sync holds or waits on it.
    fn release_wallet_lock(&self, wallet: &Address, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .wallet_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one held here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(wallet.as_str());
        }
    }

    #[cfg(test)]
    fn tracked_wallets(&self) -> usize {
        self.wallet_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasource::MockDataSource;
    use crate::db::repo::test_support::setup_repo;
    use solana_pubkey::Pubkey;

    async fn service(datasource: MockDataSource) -> (TradeSyncService, tempfile::TempDir) {
        let (repo, temp) = setup_repo().await;
        let mut env = HashMap::new();
        env.insert("DATABASE_PATH".to_string(), ":memory:".to_string());
        let config = Config::from_env_map(env).unwrap();
        let ingestor = Ingestor::new(Arc::new(datasource), &config);
        (TradeSyncService::new(ingestor, Arc::new(repo)), temp)
    }

    #[tokio::test]
    async fn test_wallet_locks_released_after_sync() {
        let ok = Pubkey::new_from_array([42u8; 32]).to_string();
        let broken = Pubkey::new_from_array([43u8; 32]).to_string();
        let (service, _temp) = service(MockDataSource::new().with_failing_wallet(&broken)).await;

        assert!(service.sync_wallet(&ok).await.success);
        assert!(!service.sync_wallet(&broken).await.success);
        assert_eq!(service.tracked_wallets(), 0);

        let (a, b) = tokio::join!(service.sync_wallet(&ok), service.sync_wallet(&ok));
        assert!(a.success && b.success);
        assert_eq!(service.tracked_wallets(), 0);
    }
}
