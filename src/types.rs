// =============================================================================
// Shared types used across the CoinPulse engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded price reading for a single instrument.
///
/// Immutable once recorded. The collector produces one of these per coin per
/// poll; the store appends them; the indicator engine only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Display symbol, e.g. "BTC".
    pub symbol: String,
    /// Spot price in USD.
    pub price: f64,
    /// When the reading was taken (UTC).
    pub timestamp: DateTime<Utc>,
    /// Market capitalisation in USD, when the upstream API provided it.
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// 24-hour traded volume in USD, when provided.
    #[serde(default)]
    pub volume_24h: Option<f64>,
    /// 24-hour price change in percent, as reported upstream.
    #[serde(default)]
    pub change_24h_pct: Option<f64>,
}

impl Observation {
    /// Convenience constructor for readings that carry only a price.
    pub fn bare(symbol: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            market_cap: None,
            volume_24h: None,
            change_24h_pct: None,
        }
    }
}
