use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use courtbook::config::AppConfig;
use courtbook::db::SqliteStore;
use courtbook::handlers;
use courtbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    let store = SqliteStore::open(&config.database_url)
        .with_context(|| format!("failed to open database at {}", config.database_url))?;
    tracing::info!(
        database = %config.database_url,
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        "record store ready"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config, Arc::new(store)));
    let app = handlers::router(state);

    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
