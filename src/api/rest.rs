// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are read-only; nothing here writes
// to the store. Reports are recomputed from the stored series on every
// request ("given symbols S and lookback D, return Report[S]") — absent
// metrics come back as JSON `null` and must be rendered as "not enough
// data", never as zero.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::app_state::AppState;
use crate::engine::compute_report;
use crate::report::Report;
use crate::series::Series;

/// Largest accepted `days` query value.
const MAX_LOOKBACK_DAYS: i64 = 365;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/prices/:symbol", get(prices))
        .route("/api/v1/report/:symbol", get(report))
        .route("/api/v1/reports", get(reports))
        .route("/api/v1/status", get(status))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Deserialize)]
struct LookbackQuery {
    /// Days of history to read; defaults per endpoint.
    days: Option<i64>,
}

#[derive(Deserialize)]
struct ReportsQuery {
    /// Comma-separated symbols; all stored symbols when omitted.
    symbols: Option<String>,
    days: Option<i64>,
}

fn clamp_days(days: Option<i64>, default: i64) -> i64 {
    days.unwrap_or(default).clamp(1, MAX_LOOKBACK_DAYS)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Symbols
// =============================================================================

async fn symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.symbols() {
        Ok(list) => Json(list).into_response(),
        Err(e) => internal_error("failed to list symbols", e),
    }
}

// =============================================================================
// Raw series
// =============================================================================

async fn prices(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<LookbackQuery>,
) -> impl IntoResponse {
    let symbol = symbol.to_uppercase();
    let days = clamp_days(query.days, 7);
    let now = Utc::now();

    match state.store.series(&symbol, now - Duration::days(days), now) {
        Ok(rows) if rows.is_empty() => not_found(&symbol),
        Ok(rows) => Json(rows).into_response(),
        Err(e) => internal_error("failed to read series", e),
    }
}

// =============================================================================
// Reports (pull-based: recomputed per request, never persisted here)
// =============================================================================

async fn report(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<LookbackQuery>,
) -> impl IntoResponse {
    let symbol = symbol.to_uppercase();
    let default_days = state.runtime_config.read().history_days;
    let days = clamp_days(query.days, default_days);

    match compute_for(&state, &symbol, days) {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => not_found(&symbol),
        Err(e) => internal_error("failed to compute report", e),
    }
}

async fn reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportsQuery>,
) -> impl IntoResponse {
    let default_days = state.runtime_config.read().history_days;
    let days = clamp_days(query.days, default_days);

    let requested: Vec<String> = match &query.symbols {
        Some(csv) => csv
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => match state.store.symbols() {
            Ok(list) => list,
            Err(e) => return internal_error("failed to list symbols", e),
        },
    };

    let mut out: BTreeMap<String, Report> = BTreeMap::new();
    for symbol in requested {
        match compute_for(&state, &symbol, days) {
            Ok(Some(report)) => {
                out.insert(symbol, report);
            }
            // Symbols without data are omitted, not errors.
            Ok(None) => {}
            Err(e) => return internal_error("failed to compute report", e),
        }
    }
    Json(out).into_response()
}

/// Read one symbol's series and compute its report. `Ok(None)` when the
/// symbol has no stored rows in the lookback.
fn compute_for(state: &AppState, symbol: &str, days: i64) -> anyhow::Result<Option<Report>> {
    let now = Utc::now();
    let rows = state.store.series(symbol, now - Duration::days(days), now)?;
    if rows.is_empty() {
        return Ok(None);
    }
    let series = Series::new(rows)?;
    let ma_windows = state.runtime_config.read().ma_windows.clone();
    Ok(Some(compute_report(&series, now, &ma_windows)))
}

// =============================================================================
// Status
// =============================================================================

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let poller = state.poller_status.read().clone();
    let (coins, poll_interval_minutes) = {
        let cfg = state.runtime_config.read();
        (cfg.coins.clone(), cfg.poll_interval_minutes)
    };

    Json(serde_json::json!({
        "poller": poller,
        "coins": coins,
        "poll_interval_minutes": poll_interval_minutes,
        "uptime_secs": state.uptime_secs(),
    }))
}

// =============================================================================
// Response helpers
// =============================================================================

fn not_found(symbol: &str) -> axum::response::Response {
    let body = serde_json::json!({
        "error": "no data for symbol",
        "symbol": symbol,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn internal_error(message: &str, e: anyhow::Error) -> axum::response::Response {
    error!(error = %e, "{message}");
    let body = serde_json::json!({ "error": message });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
