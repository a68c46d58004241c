use anyhow::Context;
use fleetdesk::{
    config::Config,
    routes::app,
    services::scheduler::spawn_sweeps,
    state::AppState,
    store::{MemoryStore, PgStore, Store},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ─── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleetdesk=debug,tower_http=info")),
        )
        .init();

    // ─── Config ───────────────────────────────────────────────────────────────
    let config = Config::from_env().context("invalid configuration")?;
    let addr = config.server_addr();

    // ─── Storage ──────────────────────────────────────────────────────────────
    let store: Arc<dyn Store> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store
                .run_migrations()
                .await
                .context("failed to run database migrations")?;
            info!("Database connected and migrations applied");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // ─── App State ────────────────────────────────────────────────────────────
    let state = AppState::new(store, config);
    spawn_sweeps(state.clone());

    // ─── Start Server ─────────────────────────────────────────────────────────
    info!("Fleetdesk API listening on http://{}", addr);
    info!("Swagger UI:  http://{}/docs", addr);
    info!("Health:      http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    axum::serve(listener, app(state))
        .await
        .context("server failed")?;
    Ok(())
}
