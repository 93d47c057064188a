use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub message: String,
    pub mutated_count: usize,
}

pub async fn post_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    let wallet = request
        .wallet_address
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::BadRequest("Wallet address required".into()))?;

    let result = state.sync_service.sync_wallet(wallet).await;
    if !result.success {
        return Err(AppError::Internal(
            result.error.unwrap_or_else(|| "Sync failed".to_string()),
        ));
    }

    Ok(Json(SyncResponse {
        message: format!("Successfully synced {} trades", result.mutated_count),
        mutated_count: result.mutated_count,
    }))
}
