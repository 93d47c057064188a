//! Solana JSON-RPC client implementation.

use super::{DataSource, DataSourceError};
use crate::domain::{CompiledInstruction, RawTransaction};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Data source backed by a Solana JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct SolanaRpcDataSource {
    client: Client,
    rpc_url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInfo {
    signature: String,
    #[serde(default)]
    err: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponse {
    block_time: Option<i64>,
    meta: Option<TransactionMeta>,
    transaction: EncodedTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMeta {
    fee: u64,
    #[serde(default)]
    log_messages: Option<Vec<String>>,
    #[serde(default)]
    loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Debug, Default, Deserialize)]
struct LoadedAddresses {
    #[serde(default)]
    writable: Vec<String>,
    #[serde(default)]
    readonly: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EncodedTransaction {
    #[serde(default)]
    signatures: Vec<String>,
    message: EncodedMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedMessage {
    account_keys: Vec<String>,
    #[serde(default)]
    instructions: Vec<EncodedInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedInstruction {
    program_id_index: usize,
}

impl SolanaRpcDataSource {
    /// Create a new data source for the given RPC endpoint.
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
        }
    }

    async fn call<T: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, DataSourceError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let response: RpcResponse<T> = retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<RpcResponse<T>>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await?;

        if let Some(err) = response.error {
            return Err(DataSourceError::RpcError {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result)
    }
}

#[async_trait]
impl DataSource for SolanaRpcDataSource {
    async fn fetch_signatures(
        &self,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<String>, DataSourceError> {
        debug!(wallet = %wallet, limit, "Listing signatures");

        let params = serde_json::json!([wallet, { "limit": limit }]);
        let infos: Vec<SignatureInfo> = self
            .call("getSignaturesForAddress", params)
            .await?
            .ok_or_else(|| DataSourceError::ParseError("Missing result".to_string()))?;

        Ok(signatures_from_infos(infos))
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, DataSourceError> {
        let params = serde_json::json!([
            signature,
            {
                "encoding": "json",
                "maxSupportedTransactionVersion": 0,
                "commitment": "confirmed"
            }
        ]);
        let response: Option<TransactionResponse> = self.call("getTransaction", params).await?;
        Ok(response.map(|tx| to_raw_transaction(signature, tx)))
    }
}

/// Drop transactions that failed on chain; their logs describe no effect.
fn signatures_from_infos(infos: Vec<SignatureInfo>) -> Vec<String> {
    infos
        .into_iter()
        .filter(|info| info.err.as_ref().map_or(true, |e| e.is_null()))
        .map(|info| info.signature)
        .collect()
}

fn to_raw_transaction(requested: &str, tx: TransactionResponse) -> RawTransaction {
    let signature = tx
        .transaction
        .signatures
        .first()
        .cloned()
        .unwrap_or_else(|| requested.to_string());
    let meta = tx.meta;
    let (fee, logs, loaded) = match meta {
        Some(m) => (
            m.fee,
            m.log_messages.unwrap_or_default(),
            m.loaded_addresses.unwrap_or_default(),
        ),
        None => (0, Vec::new(), LoadedAddresses::default()),
    };

    RawTransaction {
        signature,
        block_time: tx.block_time,
        fee_lamports: fee,
        log_messages: logs,
        instructions: tx
            .transaction
            .message
            .instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: ix.program_id_index,
            })
            .collect(),
        account_keys: tx.transaction.message.account_keys,
        loaded_writable: loaded.writable,
        loaded_readonly: loaded.readonly,
    }
}
