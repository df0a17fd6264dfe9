// =============================================================================
// Report — named derived metrics for one instrument at one point in time
// =============================================================================
//
// Every metric is independently optional: missing history for one metric
// never prevents the others, and an absent metric serialises as `null` —
// consumers must render it as "not enough data", never as zero.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Price extrema of one window, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRange {
    pub min_price: f64,
    pub max_price: f64,
    /// When the minimum occurred, `%Y-%m-%d %H:%M` UTC.
    pub min_time: String,
    /// When the maximum occurred, `%Y-%m-%d %H:%M` UTC.
    pub max_time: String,
}

/// The indicator engine's output for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub symbol: String,
    /// The reference instant the report was computed against.
    pub generated_at: DateTime<Utc>,
    pub current_price: Option<f64>,
    /// Number of observations the report was computed from.
    pub data_points: usize,

    /// `"ma_{w}d"` -> trailing mean of the last `w` observations.
    pub moving_averages: BTreeMap<String, Option<f64>>,

    pub change_1h: Option<f64>,
    pub change_24h: Option<f64>,
    pub change_7d: Option<f64>,
    pub change_30d: Option<f64>,

    pub volatility_7d: Option<f64>,
    pub volatility_30d: Option<f64>,

    pub min_max_7d: Option<PriceRange>,
    pub min_max_30d: Option<PriceRange>,

    pub rsi_14: Option<f64>,

    /// Pass-through of the latest observation's market cap, when present.
    pub market_cap: Option<f64>,
    /// Pass-through of the latest observation's 24 h volume, when present.
    pub volume_24h: Option<f64>,
}

/// One flattened metric ready for the analytics sink.
///
/// Field names mirror the `analytics` table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub metric_name: String,
    pub metric_value: f64,
    pub time_period: String,
}

impl Report {
    /// Flatten the present numeric metrics into sink rows.
    ///
    /// Absent metrics produce no row. Extrema are not persisted — they are
    /// recomputed on demand by the query surface.
    pub fn metric_rows(&self) -> Vec<MetricRow> {
        let mut rows = Vec::new();

        for (name, value) in &self.moving_averages {
            if let Some(v) = value {
                // "ma_7d" is tagged with its own window: "7d".
                let period = name.strip_prefix("ma_").unwrap_or(name);
                rows.push(MetricRow {
                    metric_name: name.clone(),
                    metric_value: *v,
                    time_period: period.to_string(),
                });
            }
        }

        let changes = [
            ("change_1h", self.change_1h),
            ("change_24h", self.change_24h),
            ("change_7d", self.change_7d),
            ("change_30d", self.change_30d),
        ];
        for (name, value) in changes {
            if let Some(v) = value {
                rows.push(MetricRow {
                    metric_name: name.to_string(),
                    metric_value: v,
                    time_period: "current".to_string(),
                });
            }
        }

        let volatilities = [
            ("volatility_7d", self.volatility_7d, "7d"),
            ("volatility_30d", self.volatility_30d, "30d"),
        ];
        for (name, value, period) in volatilities {
            if let Some(v) = value {
                rows.push(MetricRow {
                    metric_name: name.to_string(),
                    metric_value: v,
                    time_period: period.to_string(),
                });
            }
        }

        if let Some(v) = self.rsi_14 {
            rows.push(MetricRow {
                metric_name: "rsi_14".to_string(),
                metric_value: v,
                time_period: "14d".to_string(),
            });
        }

        rows
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn empty_report() -> Report {
        Report {
            symbol: "BTC".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            current_price: None,
            data_points: 0,
            moving_averages: BTreeMap::new(),
            change_1h: None,
            change_24h: None,
            change_7d: None,
            change_30d: None,
            volatility_7d: None,
            volatility_30d: None,
            min_max_7d: None,
            min_max_30d: None,
            rsi_14: None,
            market_cap: None,
            volume_24h: None,
        }
    }

    #[test]
    fn rows_empty_when_no_metric_present() {
        assert!(empty_report().metric_rows().is_empty());
    }

    #[test]
    fn rows_only_for_present_metrics() {
        let mut report = empty_report();
        report.moving_averages.insert("ma_7d".to_string(), Some(107.57));
        report.moving_averages.insert("ma_30d".to_string(), None);
        report.change_1h = Some(10.0);
        report.volatility_30d = Some(1.25);
        report.rsi_14 = Some(51.95);

        let rows = report.metric_rows();
        assert_eq!(rows.len(), 4);

        let names: Vec<&str> = rows.iter().map(|r| r.metric_name.as_str()).collect();
        assert!(names.contains(&"ma_7d"));
        assert!(!names.contains(&"ma_30d"));
        assert!(names.contains(&"change_1h"));
        assert!(names.contains(&"volatility_30d"));
        assert!(names.contains(&"rsi_14"));
    }

    #[test]
    fn rows_carry_expected_period_tags() {
        let mut report = empty_report();
        report.moving_averages.insert("ma_7d".to_string(), Some(1.0));
        report.moving_averages.insert("ma_30d".to_string(), Some(2.0));
        report.change_24h = Some(3.0);
        report.volatility_7d = Some(4.0);
        report.rsi_14 = Some(5.0);

        let period_of = |name: &str| {
            report
                .metric_rows()
                .into_iter()
                .find(|r| r.metric_name == name)
                .map(|r| r.time_period)
                .unwrap()
        };

        assert_eq!(period_of("ma_7d"), "7d");
        assert_eq!(period_of("ma_30d"), "30d");
        assert_eq!(period_of("change_24h"), "current");
        assert_eq!(period_of("volatility_7d"), "7d");
        assert_eq!(period_of("rsi_14"), "14d");
    }
}
