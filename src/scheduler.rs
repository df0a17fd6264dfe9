// =============================================================================
// Scheduler — polling loop and analytics refresh
// =============================================================================
//
// Two long-lived tasks:
//
//   run_poller            — fetch-and-store on a fixed interval (first run
//                           immediate), then refresh analytics for every
//                           stored symbol after each successful poll.
//   run_analytics_refresh — independent hourly sweep of the same refresh,
//                           so metrics stay current even if polling stalls.
//
// Retry bookkeeping is deliberately local to the poller task: the counters
// are plain locals, and only a read-only snapshot is published to AppState
// for the status endpoint. Hitting the consecutive-failure ceiling logs an
// escalated error and resets the run so polling never wedges.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::app_state::{AppState, PollerStatus};
use crate::collector::{self, CoinGeckoClient};
use crate::engine::compute_report;
use crate::series::Series;

/// Run the price poller until the process exits.
pub async fn run_poller(state: Arc<AppState>, client: CoinGeckoClient) {
    let (interval_minutes, max_failures) = {
        let cfg = state.runtime_config.read();
        (
            cfg.poll_interval_minutes.max(1),
            cfg.max_consecutive_failures.max(1),
        )
    };
    info!(interval_minutes, "price poller starting");

    // Task-local retry counters — shared state only sees snapshots.
    let mut total_failures: u64 = 0;
    let mut consecutive_failures: u32 = 0;

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(interval_minutes * 60));
    loop {
        // The first tick fires immediately: the initial fetch.
        interval.tick().await;

        let coins = state.runtime_config.read().coins.clone();
        let last_run = Utc::now();

        match collector::fetch_and_store(&client, &state.store, &coins).await {
            Ok(stored) => {
                consecutive_failures = 0;
                state.set_poller_status(PollerStatus {
                    total_failures,
                    consecutive_failures,
                    last_run: Some(last_run),
                    last_success: Some(Utc::now()),
                    last_error: None,
                });
                info!(stored, "scheduled fetch complete");

                // Analytics failures are logged but never counted against
                // the fetch loop.
                if let Err(e) = update_all_analytics(&state) {
                    error!(error = %e, "analytics update failed");
                }
            }
            Err(e) => {
                total_failures += 1;
                consecutive_failures += 1;
                warn!(
                    error = %e,
                    consecutive = consecutive_failures,
                    "price poll failed"
                );

                if consecutive_failures >= max_failures {
                    error!(
                        consecutive = consecutive_failures,
                        "too many consecutive poll failures — check API status or network connectivity"
                    );
                    // Reset so the loop keeps trying instead of wedging.
                    consecutive_failures = 0;
                }

                let last_success = state.poller_status.read().last_success;
                state.set_poller_status(PollerStatus {
                    total_failures,
                    consecutive_failures,
                    last_run: Some(last_run),
                    last_success,
                    last_error: Some(e.to_string()),
                });
            }
        }
    }
}

/// Periodic full analytics sweep, independent of the poll cadence.
pub async fn run_analytics_refresh(state: Arc<AppState>) {
    let minutes = state.runtime_config.read().analytics_refresh_minutes.max(1);
    info!(interval_minutes = minutes, "analytics refresh task starting");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(minutes * 60));
    // Skip the immediate first tick — the poller refreshes after each fetch.
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = update_all_analytics(&state) {
            error!(error = %e, "scheduled analytics refresh failed");
        }
    }
}

/// Recompute and persist reports for every stored symbol.
///
/// A failure for one symbol is logged and does not stop the sweep.
/// Returns the total number of metric rows written.
pub fn update_all_analytics(state: &AppState) -> Result<usize> {
    let (history_days, ma_windows) = {
        let cfg = state.runtime_config.read();
        (cfg.history_days, cfg.ma_windows.clone())
    };

    let symbols = state.store.symbols().context("failed to list symbols")?;
    let now = Utc::now();

    let mut written = 0;
    for symbol in &symbols {
        match refresh_symbol(state, symbol, history_days, &ma_windows) {
            Ok(rows) => written += rows,
            Err(e) => error!(symbol = %symbol, error = %e, "analytics update failed for symbol"),
        }
    }

    info!(
        symbols = symbols.len(),
        rows = written,
        elapsed_ms = (Utc::now() - now).num_milliseconds(),
        "analytics refresh complete"
    );
    Ok(written)
}

fn refresh_symbol(
    state: &AppState,
    symbol: &str,
    history_days: i64,
    ma_windows: &[usize],
) -> Result<usize> {
    let now = Utc::now();
    let rows = state
        .store
        .series(symbol, now - Duration::days(history_days), now)?;
    let series = Series::new(rows)?;
    let report = compute_report(&series, now, ma_windows);
    state.store.store_report(&report)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::store::PriceStore;
    use crate::types::Observation;

    fn seeded_state() -> Arc<AppState> {
        let store = Arc::new(PriceStore::open_in_memory().unwrap());
        let now = Utc::now();

        // 8 daily rows per symbol: enough for ma_7d, changes, volatility.
        for symbol in ["BTC", "ETH"] {
            for d in 0..8_i64 {
                let obs = Observation::bare(
                    symbol,
                    100.0 + d as f64,
                    now - Duration::days(7 - d),
                );
                store.insert_observation(&symbol.to_lowercase(), &obs).unwrap();
            }
        }

        Arc::new(AppState::new(RuntimeConfig::default(), store))
    }

    #[test]
    fn update_all_analytics_writes_rows_per_symbol() {
        let state = seeded_state();
        let written = update_all_analytics(&state).unwrap();
        assert!(written > 0);

        // Every stored symbol got its sweep.
        for symbol in ["BTC", "ETH"] {
            let rows = state
                .store
                .series(symbol, Utc::now() - Duration::days(30), Utc::now())
                .unwrap();
            assert_eq!(rows.len(), 8, "price rows intact for {symbol}");
        }
    }

    #[test]
    fn update_all_analytics_empty_store_is_a_noop() {
        let store = Arc::new(PriceStore::open_in_memory().unwrap());
        let state = Arc::new(AppState::new(RuntimeConfig::default(), store));
        assert_eq!(update_all_analytics(&state).unwrap(), 0);
    }
}
