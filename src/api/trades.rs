use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::TradeQuery;
use crate::domain::{Address, Direction, PersistedTrade, Symbol, TradeStatus};
use crate::error::AppError;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesQuery {
    pub wallet: String,
    pub status: Option<String>,
    pub symbol: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WalletParam {
    pub wallet: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesResponse {
    pub trades: Vec<TradeDto>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub id: String,
    pub timestamp_ms: i64,
    pub direction: String,
    pub symbol: String,
    pub status: String,
    pub entry_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<String>,
    pub size: String,
    pub fee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_timestamp_ms: Option<i64>,
}

impl From<PersistedTrade> for TradeDto {
    fn from(t: PersistedTrade) -> Self {
        TradeDto {
            id: t.id,
            timestamp_ms: t.timestamp.as_ms(),
            direction: t.direction.to_string(),
            symbol: t.symbol.as_str().to_string(),
            status: t.status.to_string(),
            entry_price: t.entry_price.to_canonical_string(),
            exit_price: t.exit_price.map(|d| d.to_canonical_string()),
            size: t.size.to_canonical_string(),
            fee: t.fee.to_canonical_string(),
            pnl: t.pnl.map(|d| d.to_canonical_string()),
            entry_timestamp_ms: t.entry_timestamp.map(|ts| ts.as_ms()),
        }
    }
}

/// List a wallet's stored trades, newest first.
pub async fn get_trades(
    Query(params): Query<TradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let wallet = Address::parse(&params.wallet)?;

    let filter = TradeQuery {
        status: parse_filter::<TradeStatus>(params.status.as_deref(), "status")?,
        symbol: params
            .symbol
            .filter(|s| !s.is_empty())
            .map(Symbol::new),
        direction: parse_filter::<Direction>(params.direction.as_deref(), "direction")?,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let trades = state.repo.query_trades(&wallet, &filter).await?;
    let total = trades.len();
    let trades = trades
        .into_iter()
        .rev()
        .skip(offset)
        .take(limit)
        .map(TradeDto::from)
        .collect();

    Ok(Json(TradesResponse {
        trades,
        total,
        limit,
        offset,
    }))
}

pub async fn get_trade(
    Path(id): Path<String>,
    Query(params): Query<WalletParam>,
    State(state): State<AppState>,
) -> Result<Json<TradeDto>, AppError> {
    let wallet = Address::parse(&params.wallet)?;
    state
        .repo
        .get_trade(&wallet, &id)
        .await?
        .map(|t| Json(TradeDto::from(t)))
        .ok_or_else(|| AppError::NotFound(format!("Trade {} not found", id)))
}

fn parse_filter<T: std::str::FromStr>(
    value: Option<&str>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", name, v))),
    }
}
