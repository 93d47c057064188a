use anyhow::Context;
use deriverse_ledger::orchestration::{Ingestor, TradeSyncService};
use deriverse_ledger::{
    api, config::Config, db::init_db, DataSource, Repository, SolanaRpcDataSource,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let repo = Arc::new(Repository::new(pool));
    let datasource: Arc<dyn DataSource> =
        Arc::new(SolanaRpcDataSource::new(config.rpc_url.clone()));
    let ingestor = Ingestor::new(datasource, &config);
    let sync_service = Arc::new(TradeSyncService::new(ingestor, repo.clone()));

    tracing::info!(
        rpc_url = %config.rpc_url,
        programs = config.program_ids.len(),
        signature_limit = config.signature_limit,
        "Trade sync configured"
    );

    let app = api::create_router(api::AppState::new(repo, sync_service));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
