mod common;

use axum::http::StatusCode;
use common::*;
use deriverse_ledger::api::{self, AppState};
use deriverse_ledger::config::Config;
use deriverse_ledger::datasource::MockDataSource;
use deriverse_ledger::db::init_db;
use deriverse_ledger::orchestration::{Ingestor, TradeSyncService};
use deriverse_ledger::Repository;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app(datasource: MockDataSource) -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let mut env = HashMap::new();
    env.insert("DATABASE_PATH".to_string(), db_path);
    let config = Config::from_env_map(env).unwrap();

    let ingestor = Ingestor::new(Arc::new(datasource), &config);
    let sync_service = Arc::new(TradeSyncService::new(ingestor, repo.clone()));
    let app = api::create_router(AppState::new(repo, sync_service));

    (app, temp_dir)
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = send(app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_sync_endpoint_success() {
    let wallet = wallet_key(42);
    let datasource = MockDataSource::new()
        .with_transaction(&wallet, perp_trade_tx("open", 100, 1, BUY, 1.0, 100.0, 0.01));
    let (app, _temp) = setup_test_app(datasource).await;

    let (status, body) = send(
        app,
        "POST",
        "/v1/sync",
        Some(serde_json::json!({"walletAddress": wallet})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mutatedCount"], 1);
    assert_eq!(body["message"], "Successfully synced 1 trades");
}

#[tokio::test]
async fn test_sync_endpoint_requires_wallet() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = send(app.clone(), "POST", "/v1/sync", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        app,
        "POST",
        "/v1/sync",
        Some(serde_json::json!({"walletAddress": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sync_endpoint_reports_failure() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = send(
        app,
        "POST",
        "/v1/sync",
        Some(serde_json::json!({"walletAddress": "not-a-wallet"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Invalid wallet address"));
}

#[tokio::test]
async fn test_trades_endpoint_lists_synced_trades() {
    let wallet = wallet_key(42);
    let datasource = MockDataSource::new().with_transactions(
        &wallet,
        vec![
            perp_trade_tx("first", 100, 1, BUY, 1.0, 100.0, 0.01),
            perp_trade_tx("second", 200, 2, BUY, 2.0, 101.0, 0.01),
        ],
    );
    let (app, _temp) = setup_test_app(datasource).await;

    let (status, _) = send(
        app.clone(),
        "POST",
        "/v1/sync",
        Some(serde_json::json!({"walletAddress": wallet})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app.clone(),
        "GET",
        &format!("/v1/trades?wallet={}&status=OPEN&limit=1", wallet),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["trades"].as_array().unwrap().len(), 1);
    assert_eq!(body["trades"][0]["id"], "second");
    assert_eq!(body["trades"][0]["direction"], "LONG");
    assert_eq!(body["trades"][0]["size"], "2");

    let (status, body) = send(
        app.clone(),
        "GET",
        &format!("/v1/trades/first?wallet={}", wallet),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entryPrice"], "100");

    let (status, _) = send(
        app,
        "GET",
        &format!("/v1/trades/missing?wallet={}", wallet),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trades_endpoint_rejects_bad_filters() {
    let wallet = wallet_key(42);
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, _) = send(
        app.clone(),
        "GET",
        &format!("/v1/trades?wallet={}&status=PENDING", wallet),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, "GET", "/v1/trades?wallet=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
