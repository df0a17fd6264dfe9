// =============================================================================
// Indicator Engine — one series in, one report out
// =============================================================================
//
// `compute_report` is the engine's entire surface: a pure function of
// (series, now, windows). It never fails — insufficient history yields an
// unavailable metric, not an error — and it never reads the system clock,
// so results are reproducible in tests.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::indicators::{change, minmax, round2, rsi, sma, volatility};
use crate::report::{PriceRange, Report};
use crate::series::Series;
use crate::types::Observation;

/// RSI look-back, in deltas.
pub const RSI_PERIOD: usize = 14;

/// Default moving-average windows, in observations.
pub const DEFAULT_MA_WINDOWS: [usize; 2] = [7, 30];

/// Timestamp format used for extrema occurrence times.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Compute the full indicator report for one symbol's series.
///
/// * `series` — ordered observations for exactly one symbol (may be empty).
/// * `now` — the reference instant; all time-windowed metrics measure
///   lookbacks backwards from here.
/// * `ma_windows` — trailing row-count windows for the moving averages.
///
/// Every metric in the result is independently optional.
pub fn compute_report(series: &Series, now: DateTime<Utc>, ma_windows: &[usize]) -> Report {
    let observations = series.observations();
    let closes = series.prices();
    let latest = series.last();

    let mut moving_averages = BTreeMap::new();
    for &window in ma_windows {
        moving_averages.insert(
            format!("ma_{window}d"),
            sma::current_sma(&closes, window).map(round2),
        );
    }

    Report {
        symbol: latest.map(|o| o.symbol.clone()).unwrap_or_default(),
        generated_at: now,
        current_price: latest.map(|o| round2(o.price)),
        data_points: series.len(),
        moving_averages,

        change_1h: change_over(observations, now, Duration::hours(1)),
        change_24h: change_over(observations, now, Duration::days(1)),
        change_7d: change_over(observations, now, Duration::days(7)),
        change_30d: change_over(observations, now, Duration::days(30)),

        volatility_7d: volatility_over(series, now, Duration::days(7)),
        volatility_30d: volatility_over(series, now, Duration::days(30)),

        min_max_7d: extrema_over(observations, now, Duration::days(7)),
        min_max_30d: extrema_over(observations, now, Duration::days(30)),

        rsi_14: rsi::current_rsi(&closes, RSI_PERIOD).map(round2),

        market_cap: latest.and_then(|o| o.market_cap),
        volume_24h: latest.and_then(|o| o.volume_24h),
    }
}

fn change_over(
    observations: &[Observation],
    now: DateTime<Utc>,
    lookback: Duration,
) -> Option<f64> {
    change::percentage_change(observations, now, lookback).map(round2)
}

fn volatility_over(series: &Series, now: DateTime<Utc>, window: Duration) -> Option<f64> {
    // Restrict to the reporting window first; the volatility math only ever
    // sees the window's closes.
    let closes: Vec<f64> = series.since(now - window).iter().map(|o| o.price).collect();
    volatility::window_volatility(&closes).map(round2)
}

fn extrema_over(
    observations: &[Observation],
    now: DateTime<Utc>,
    window: Duration,
) -> Option<PriceRange> {
    minmax::window_min_max(observations, now, window).map(|ex| PriceRange {
        min_price: round2(ex.min_price),
        max_price: round2(ex.max_price),
        min_time: ex.min_at.format(TIME_FORMAT).to_string(),
        max_time: ex.max_at.format(TIME_FORMAT).to_string(),
    })
}
