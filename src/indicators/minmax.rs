// =============================================================================
// Window Min / Max — price extrema with occurrence times
// =============================================================================
//
// Restricts the series to `timestamp >= now - window` and reports the lowest
// and highest price in that range, together with when each occurred. On
// equal prices the first occurrence wins.
// =============================================================================

use chrono::{DateTime, Duration, Utc};

use crate::types::Observation;

/// Price extrema of one lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowExtrema {
    pub min_price: f64,
    pub max_price: f64,
    pub min_at: DateTime<Utc>,
    pub max_at: DateTime<Utc>,
}

/// Min and max price over `[now - window, now]`.
///
/// `observations` must be ascending by timestamp (the `Series` contract).
/// `None` when no observation falls inside the window.
pub fn window_min_max(
    observations: &[Observation],
    now: DateTime<Utc>,
    window: Duration,
) -> Option<WindowExtrema> {
    let cutoff = now - window;
    let start = observations.partition_point(|o| o.timestamp < cutoff);
    let in_window = &observations[start..];

    let first = in_window.first()?;
    let mut extrema = WindowExtrema {
        min_price: first.price,
        max_price: first.price,
        min_at: first.timestamp,
        max_at: first.timestamp,
    };

    for obs in &in_window[1..] {
        if obs.price < extrema.min_price {
            extrema.min_price = obs.price;
            extrema.min_at = obs.timestamp;
        }
        if obs.price > extrema.max_price {
            extrema.max_price = obs.price;
            extrema.max_at = obs.timestamp;
        }
    }

    Some(extrema)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn obs(hours_ago: i64, price: f64, now: DateTime<Utc>) -> Observation {
        Observation::bare("BTC", price, now - Duration::hours(hours_ago))
    }

    #[test]
    fn minmax_empty_series() {
        assert!(window_min_max(&[], fixed_now(), Duration::days(7)).is_none());
    }

    #[test]
    fn minmax_nothing_in_window() {
        let now = fixed_now();
        let series = vec![obs(48, 100.0, now)];
        assert!(window_min_max(&series, now, Duration::days(1)).is_none());
    }

    #[test]
    fn minmax_basic() {
        let now = fixed_now();
        let series = vec![
            obs(6, 105.0, now),
            obs(4, 99.0, now),
            obs(2, 120.0, now),
            obs(0, 110.0, now),
        ];
        let ex = window_min_max(&series, now, Duration::days(1)).unwrap();
        assert_eq!(ex.min_price, 99.0);
        assert_eq!(ex.max_price, 120.0);
        assert_eq!(ex.min_at, now - Duration::hours(4));
        assert_eq!(ex.max_at, now - Duration::hours(2));
    }

    #[test]
    fn minmax_excludes_rows_before_window() {
        // The 10-day-old spike must not leak into a 7-day window.
        let now = fixed_now();
        let series = vec![obs(240, 500.0, now), obs(12, 100.0, now), obs(0, 101.0, now)];
        let ex = window_min_max(&series, now, Duration::days(7)).unwrap();
        assert_eq!(ex.max_price, 101.0);
        assert_eq!(ex.min_price, 100.0);
    }

    #[test]
    fn minmax_min_bounds_every_window_price() {
        let now = fixed_now();
        let series: Vec<Observation> = [104.0, 99.5, 131.2, 99.5, 120.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| obs(8 - 2 * i as i64, p, now))
            .collect();
        let ex = window_min_max(&series, now, Duration::days(7)).unwrap();
        for o in &series {
            assert!(ex.min_price <= o.price);
            assert!(ex.max_price >= o.price);
        }
        // Equality holds at the argmin, first occurrence on ties.
        assert_eq!(ex.min_price, 99.5);
        assert_eq!(ex.min_at, now - Duration::hours(6));
    }

    #[test]
    fn minmax_single_observation() {
        let now = fixed_now();
        let series = vec![obs(1, 42.0, now)];
        let ex = window_min_max(&series, now, Duration::days(1)).unwrap();
        assert_eq!(ex.min_price, 42.0);
        assert_eq!(ex.max_price, 42.0);
        assert_eq!(ex.min_at, ex.max_at);
    }
}
