// =============================================================================
// CoinPulse — Main Entry Point
// =============================================================================
//
// Polls the CoinGecko price API on a fixed interval, persists readings to
// SQLite, recomputes indicator reports, and serves both over a read-only
// HTTP API.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod collector;
mod engine;
mod indicators;
mod report;
mod runtime_config;
mod scheduler;
mod series;
mod store;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::collector::CoinGeckoClient;
use crate::runtime_config::{symbol_for_id, CoinConfig, RuntimeConfig};
use crate::store::PriceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║              CoinPulse — Starting Up                    ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override coins from env if available (comma-separated CoinGecko ids).
    if let Ok(ids) = std::env::var("COINPULSE_COINS") {
        config.coins = ids
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|id| CoinConfig {
                symbol: symbol_for_id(&id),
                id,
            })
            .collect();
    }
    if let Ok(addr) = std::env::var("COINPULSE_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if config.coins.is_empty() {
        config.coins = RuntimeConfig::default().coins;
    }

    info!(
        coins = ?config.coins.iter().map(|c| c.symbol.as_str()).collect::<Vec<_>>(),
        poll_interval_minutes = config.poll_interval_minutes,
        "Configured coins"
    );

    // ── 2. Open the store ────────────────────────────────────────────────
    let store = Arc::new(PriceStore::open(&config.db_path)?);

    // ── 3. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, store));

    // ── 4. Price poller ──────────────────────────────────────────────────
    let poller_state = state.clone();
    tokio::spawn(async move {
        scheduler::run_poller(poller_state, CoinGeckoClient::new()).await;
    });

    // ── 5. Hourly analytics refresh ──────────────────────────────────────
    let refresh_state = state.clone();
    tokio::spawn(async move {
        scheduler::run_analytics_refresh(refresh_state).await;
    });

    // ── 6. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr_clone = bind_addr.clone();
    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 7. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save("runtime_config.json") {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("CoinPulse shut down complete.");
    Ok(())
}
