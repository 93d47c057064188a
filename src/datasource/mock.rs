//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError};
use crate::domain::RawTransaction;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Mock data source that returns predefined test data.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    /// Signatures per wallet, newest first.
    signatures: HashMap<String, Vec<String>>,
    transactions: HashMap<String, RawTransaction>,
    failing_signatures: HashSet<String>,
    failing_wallets: HashSet<String>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transaction and list its signature for `wallet`.
    pub fn with_transaction(mut self, wallet: &str, tx: RawTransaction) -> Self {
        self.signatures
            .entry(wallet.to_string())
            .or_default()
            .push(tx.signature.clone());
        self.transactions.insert(tx.signature.clone(), tx);
        self
    }

    /// Add multiple transactions for one wallet.
    pub fn with_transactions(self, wallet: &str, txs: Vec<RawTransaction>) -> Self {
        txs.into_iter()
            .fold(self, |mock, tx| mock.with_transaction(wallet, tx))
    }

    /// List a signature whose transaction the node cannot return.
    pub fn with_missing_signature(mut self, wallet: &str, signature: &str) -> Self {
        self.signatures
            .entry(wallet.to_string())
            .or_default()
            .push(signature.to_string());
        self
    }

    /// Make fetching this signature fail.
    pub fn with_failing_signature(mut self, wallet: &str, signature: &str) -> Self {
        self = self.with_missing_signature(wallet, signature);
        self.failing_signatures.insert(signature.to_string());
        self
    }

    /// Make signature listing fail for this wallet.
    pub fn with_failing_wallet(mut self, wallet: &str) -> Self {
        self.failing_wallets.insert(wallet.to_string());
        self
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_signatures(
        &self,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<String>, DataSourceError> {
        if self.failing_wallets.contains(wallet) {
            return Err(DataSourceError::HttpError {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }

        Ok(self
            .signatures
            .get(wallet)
            .map(|sigs| sigs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, DataSourceError> {
        if self.failing_signatures.contains(signature) {
            return Err(DataSourceError::NetworkError("connection reset".to_string()));
        }
        Ok(self.transactions.get(signature).cloned())
    }
}
