use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use waghl_api::clock::{Clock, SystemClock};
use waghl_api::config::AppConfig;
use waghl_api::database::{CustomerStore, DatabaseManager, MemoryCustomerStore, PgCustomerStore};
use waghl_api::server;
use waghl_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waghl_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting WhatsApp-GHL Bridge API in {:?} mode", config.environment);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(&config, clock.clone()).await?;
    let port = config.server.port;
    let state = AppState::new(config, store, clock).context("invalid configuration")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    server::serve(listener, state).await?;
    Ok(())
}

async fn build_store(config: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Arc<dyn CustomerStore>> {
    if config.database.url.is_some() {
        let pool = DatabaseManager::connect(&config.database).await?;
        return Ok(Arc::new(PgCustomerStore::new(pool)));
    }

    if !config.is_development() {
        bail!("DATABASE_URL is required outside development");
    }

    let now = clock.now();
    let store = MemoryCustomerStore::with_clock(clock);
    for (email, id) in store.seed_demo(now).await {
        tracing::info!("Seeded demo customer {} ({})", email, id);
    }
    tracing::warn!("DATABASE_URL not set; using the in-memory store");
    Ok(Arc::new(store))
}
