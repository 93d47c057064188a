//! Data source abstraction for fetching wallet transactions from the chain.

use crate::domain::RawTransaction;
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod solana_rpc;

pub use mock::MockDataSource;
pub use solana_rpc::SolanaRpcDataSource;

/// Data source trait for listing and fetching a wallet's transactions.
///
/// Implementations must handle retry/backoff and rate limiting.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// List the most recent transaction signatures that touch `wallet`.
    ///
    /// # Arguments
    /// * `wallet` - Base58 wallet address
    /// * `limit` - Maximum number of signatures to return
    ///
    /// # Returns
    /// Signatures newest first, as reported upstream.
    async fn fetch_signatures(
        &self,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<String>, DataSourceError>;

    /// Fetch one confirmed transaction.
    ///
    /// Returns `None` if the node does not know the signature.
    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasource_error_display() {
        let err = DataSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = DataSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = DataSourceError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = DataSourceError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");

        let err = DataSourceError::RpcError {
            code: -32602,
            message: "Invalid param".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error -32602: Invalid param");
    }
}
