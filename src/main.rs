mod config;
mod db;
mod placement;
mod protocol;
mod routes;
mod services;
mod state;
mod sticker;
mod store;

use std::sync::Arc;

use crate::config::{Config, ConfigError, StoreConfig};
use crate::services::card::CardError;
use crate::store::{CardStore, MemoryCardStore, PgCardStore, SheetsCardStore, StoreError};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("card store init failed: {0}")]
    Store(#[from] StoreError),
    #[error("legacy position migration failed: {0}")]
    Migration(#[from] CardError),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn CardStore>, StartupError> {
    let store: Arc<dyn CardStore> = match config {
        StoreConfig::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(database_url, *max_connections).await?;
            Arc::new(PgCardStore::new(pool))
        }
        StoreConfig::Sheets(sheets) => Arc::new(SheetsCardStore::new(sheets)?),
        StoreConfig::Memory => {
            tracing::warn!("CARD_STORE=memory, cards are lost on restart");
            Arc::new(MemoryCardStore::new())
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = Config::from_env()?;
    let store = build_store(&config.store).await?;
    tracing::info!(backend = store.backend(), "card store ready");

    if config.migrate_legacy_positions {
        let migrated = services::card::migrate_legacy_positions(store.as_ref()).await?;
        tracing::info!(migrated, "legacy positions rewritten");
    }

    let port = config.port;
    let state = state::AppState::new(store, config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "treecard listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
