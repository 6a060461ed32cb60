use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::state::AppState;
use crate::store::MemoryStore;

mod background;
mod cancellation;
mod chart_config;
mod charts;
mod config;
mod error;
mod records;
mod routes;
mod state;
mod storage;
mod store;
mod views;
mod watchdog;

#[tokio::main]
async fn main() -> Result<()> {
    shared::init_tracing!()?;
    let config = shared::load_server_config!()?;

    let charts = chart_config::load(config.chart_config.as_deref())
        .context("failed to load chart config")?;
    let store = MemoryStore::open(&config.data_dir).with_context(|| {
        format!(
            "failed to open record store in {}",
            config.data_dir.display()
        )
    })?;
    let state = Arc::new(AppState::new(
        Arc::new(store),
        charts,
        config.request_timeout,
    ));

    background::spawn_background_workers(Arc::clone(&state));

    // Chart data and daemon ingestion: /api/*
    let api_routes = Router::new()
        .route("/esno", get(routes::esno))
        .route("/modcod", get(routes::modcod).post(routes::record_modcod))
        .route("/sdd", post(routes::record_sdd))
        .route("/watchdog", get(routes::check_watchdog))
        .route("/heartbeat", post(routes::heartbeat));

    let app = Router::new()
        .route("/", get(views::index))
        .route("/styles.css", get(views::styles))
        .nest("/api", api_routes)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
