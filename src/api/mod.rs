pub mod health;
pub mod sync;
pub mod trades;

use crate::db::Repository;
use crate::orchestration::TradeSyncService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub sync_service: Arc<TradeSyncService>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, sync_service: Arc<TradeSyncService>) -> Self {
        Self { repo, sync_service }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/sync", post(sync::post_sync))
        .route("/v1/trades", get(trades::get_trades))
        .route("/v1/trades/:id", get(trades::get_trade))
        .layer(cors)
        .with_state(state)
}
