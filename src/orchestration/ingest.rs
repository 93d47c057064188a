use crate::config::Config;
use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{Address, RawTransaction};
use crate::engine::ProgramFilter;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;

/// Pulls a wallet's recent transactions and keeps the venue ones.
#[derive(Clone)]
pub struct Ingestor {
    datasource: Arc<dyn DataSource>,
    filter: Arc<ProgramFilter>,
    signature_limit: usize,
    fetch_concurrency: usize,
}

impl Ingestor {
    pub fn new(datasource: Arc<dyn DataSource>, config: &Config) -> Self {
        Self {
            datasource,
            filter: Arc::new(ProgramFilter::new(config.program_ids.iter().copied())),
            signature_limit: config.signature_limit,
            fetch_concurrency: config.fetch_concurrency,
        }
    }

    /// List signatures, fetch each transaction and apply the program filter.
    ///
    /// Listing failure is fatal. A missing transaction or a failed fetch
    /// only skips that signature. Output keeps the listing order.
    pub async fn ingest(&self, wallet: &Address) -> Result<IngestionResult, IngestionError> {
        let signatures = self
            .datasource
            .fetch_signatures(wallet.as_str(), self.signature_limit)
            .await?;
        let signatures_listed = signatures.len();

        let fetched: Vec<Option<RawTransaction>> = stream::iter(signatures)
            .map(|signature| {
                let datasource = Arc::clone(&self.datasource);
                async move {
                    match datasource.fetch_transaction(&signature).await {
                        Ok(Some(tx)) => Some(tx),
                        Ok(None) => {
                            tracing::warn!(
                                signature = %signature,
                                "Transaction not found, skipping"
                            );
                            None
                        }
                        Err(e) => {
                            tracing::warn!(
                                signature = %signature,
                                error = %e,
                                "Failed to fetch transaction, skipping"
                            );
                            None
                        }
                    }
                }
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let transactions_fetched = fetched.iter().filter(|tx| tx.is_some()).count();
        let transactions: Vec<RawTransaction> = fetched
            .into_iter()
            .flatten()
            .filter(|tx| self.filter.is_relevant(tx))
            .collect();

        let result = IngestionResult {
            signatures_listed,
            transactions_fetched,
            transactions_skipped: signatures_listed - transactions_fetched,
            transactions_relevant: transactions.len(),
            transactions,
        };

        tracing::info!(
            wallet = %wallet,
            listed = result.signatures_listed,
            fetched = result.transactions_fetched,
            skipped = result.transactions_skipped,
            relevant = result.transactions_relevant,
            "Ingestion complete"
        );

        Ok(result)
    }
}

#[derive(Debug)]
pub struct IngestionResult {
    pub signatures_listed: usize,
    pub transactions_fetched: usize,
    pub transactions_skipped: usize,
    pub transactions_relevant: usize,
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use solana_pubkey::Pubkey;
    use std::collections::HashMap;

    fn program() -> Pubkey {
        Pubkey::new_from_array([7u8; 32])
    }

    fn test_config() -> Config {
        let mut env = HashMap::new();
        env.insert("DATABASE_PATH".to_string(), ":memory:".to_string());
        env.insert("PROGRAM_ID".to_string(), program().to_string());
        env.insert("FETCH_CONCURRENCY".to_string(), "2".to_string());
        Config::from_env_map(env).unwrap()
    }

    fn venue_tx(sig: &str) -> RawTransaction {
        RawTransaction::new(sig)
            .with_account_keys(vec![
                Pubkey::new_from_array([1u8; 32]).to_string(),
                program().to_string(),
            ])
            .with_instruction(1)
    }

    fn other_tx(sig: &str) -> RawTransaction {
        RawTransaction::new(sig)
            .with_account_keys(vec![Pubkey::new_from_array([9u8; 32]).to_string()])
            .with_instruction(0)
    }

    #[tokio::test]
    async fn test_ingest_filters_and_keeps_order() {
        let wallet = Address::new("w".to_string());
        let ds = Arc::new(
            MockDataSource::new()
                .with_transaction("w", venue_tx("a"))
                .with_transaction("w", other_tx("b"))
                .with_missing_signature("w", "gone")
                .with_failing_signature("w", "bad")
                .with_transaction("w", venue_tx("c")),
        );
        let ingestor = Ingestor::new(ds, &test_config());

        let result = ingestor.ingest(&wallet).await.unwrap();

        assert_eq!(result.signatures_listed, 5);
        assert_eq!(result.transactions_fetched, 3);
        assert_eq!(result.transactions_skipped, 2);
        assert_eq!(result.transactions_relevant, 2);
        let sigs: Vec<&str> = result.transactions.iter().map(|t| t.signature.as_str()).collect();
        assert_eq!(sigs, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_ingest_listing_failure_is_fatal() {
        let wallet = Address::new("w".to_string());
        let ds = Arc::new(MockDataSource::new().with_failing_wallet("w"));
        let ingestor = Ingestor::new(ds, &test_config());

        assert!(matches!(
            ingestor.ingest(&wallet).await,
            Err(IngestionError::DataSource(_))
        ));
    }
}
