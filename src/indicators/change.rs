// =============================================================================
// Percentage Change over a Time Lookback
// =============================================================================
//
// Compares the latest price against the earliest observation inside the
// lookback window:
//   change = (current - base) / base * 100
// where `base` is the first observation with `timestamp >= now - lookback`.
//
// Each lookback (1h, 24h, 7d, 30d) is computed independently from the same
// series — never derived from another lookback's result.
// =============================================================================

use chrono::{DateTime, Duration, Utc};

use crate::types::Observation;

/// Percentage change of the last price versus the start of the lookback
/// window ending at `now`.
///
/// `observations` must be ascending by timestamp (the `Series` contract).
///
/// # Edge cases
/// - Fewer than 2 observations inside `[now - lookback, now]` => `None`
/// - Zero or non-finite base price => `None` (degenerate input, not a value)
pub fn percentage_change(
    observations: &[Observation],
    now: DateTime<Utc>,
    lookback: Duration,
) -> Option<f64> {
    let current = observations.last()?.price;

    let cutoff = now - lookback;
    let start = observations.partition_point(|o| o.timestamp < cutoff);
    let window = &observations[start..];
    if window.len() < 2 {
        return None;
    }

    let base = window[0].price;
    if base == 0.0 {
        return None;
    }

    let change = (current - base) / base * 100.0;
    change.is_finite().then_some(change)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(minutes_ago: i64, price: f64, now: DateTime<Utc>) -> Observation {
        Observation::bare("BTC", price, now - Duration::minutes(minutes_ago))
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn change_basic_one_hour() {
        // 100 -> 110 over exactly one hour: +10%.
        let now = fixed_now();
        let series = vec![obs(60, 100.0, now), obs(0, 110.0, now)];
        let change = percentage_change(&series, now, Duration::hours(1)).unwrap();
        assert!((change - 10.0).abs() < 1e-10);
    }

    #[test]
    fn change_uses_earliest_in_window() {
        // Three points inside the window: base is the earliest, not the middle.
        let now = fixed_now();
        let series = vec![obs(50, 200.0, now), obs(25, 150.0, now), obs(0, 100.0, now)];
        let change = percentage_change(&series, now, Duration::hours(1)).unwrap();
        assert!((change - (-50.0)).abs() < 1e-10);
    }

    #[test]
    fn change_ignores_rows_before_window() {
        // The 2h-old row must not become the base of a 1h lookback.
        let now = fixed_now();
        let series = vec![obs(120, 50.0, now), obs(30, 100.0, now), obs(0, 110.0, now)];
        let change = percentage_change(&series, now, Duration::hours(1)).unwrap();
        assert!((change - 10.0).abs() < 1e-10);
    }

    #[test]
    fn change_insufficient_points_in_window() {
        // Only the latest row is inside the window.
        let now = fixed_now();
        let series = vec![obs(180, 100.0, now), obs(0, 110.0, now)];
        assert!(percentage_change(&series, now, Duration::hours(1)).is_none());
    }

    #[test]
    fn change_empty_series() {
        assert!(percentage_change(&[], fixed_now(), Duration::hours(1)).is_none());
    }

    #[test]
    fn change_zero_base_rejected() {
        let now = fixed_now();
        let series = vec![obs(30, 0.0, now), obs(0, 10.0, now)];
        assert!(percentage_change(&series, now, Duration::hours(1)).is_none());
    }

    #[test]
    fn change_scale_invariant() {
        // Multiplying every price by a positive constant leaves the result
        // unchanged.
        let now = fixed_now();
        let base: Vec<Observation> =
            vec![obs(50, 104.0, now), obs(25, 99.0, now), obs(0, 131.0, now)];
        let scaled: Vec<Observation> = base
            .iter()
            .map(|o| Observation::bare("BTC", o.price * 1000.0, o.timestamp))
            .collect();

        let a = percentage_change(&base, now, Duration::hours(1)).unwrap();
        let b = percentage_change(&scaled, now, Duration::hours(1)).unwrap();
        assert!((a - b).abs() < 1e-9);
    }
}
