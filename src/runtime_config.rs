// =============================================================================
// Runtime Configuration — collector and engine settings with atomic save
// =============================================================================
//
// Central configuration for the CoinPulse service: which coins to poll, how
// often, which moving-average windows to report, where the database lives,
// and where the API binds.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

/// CoinGecko coin ids and their display symbols.
const KNOWN_COINS: [(&str, &str); 8] = [
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("cardano", "ADA"),
    ("solana", "SOL"),
    ("polkadot", "DOT"),
    ("chainlink", "LINK"),
    ("litecoin", "LTC"),
    ("bitcoin-cash", "BCH"),
];

fn default_coins() -> Vec<CoinConfig> {
    KNOWN_COINS
        .iter()
        .map(|(id, symbol)| CoinConfig {
            id: id.to_string(),
            symbol: symbol.to_string(),
        })
        .collect()
}

fn default_poll_interval_minutes() -> u64 {
    5
}

fn default_analytics_refresh_minutes() -> u64 {
    60
}

fn default_history_days() -> i64 {
    30
}

fn default_ma_windows() -> Vec<usize> {
    crate::engine::DEFAULT_MA_WINDOWS.to_vec()
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_db_path() -> String {
    "data/crypto.db".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

/// Display symbol for a CoinGecko id: the known mapping, else the id
/// uppercased.
pub fn symbol_for_id(id: &str) -> String {
    KNOWN_COINS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| id.to_uppercase())
}

// =============================================================================
// CoinConfig
// =============================================================================

/// One polled coin: the upstream API id and the display symbol rows are
/// stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinConfig {
    pub id: String,
    pub symbol: String,
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the CoinPulse service.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Collection ----------------------------------------------------------

    /// Coins the collector polls each cycle.
    #[serde(default = "default_coins")]
    pub coins: Vec<CoinConfig>,

    /// Minutes between polls of the price API.
    #[serde(default = "default_poll_interval_minutes")]
    pub poll_interval_minutes: u64,

    /// Consecutive fetch failures before an escalated error is logged and
    /// the counter resets.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    // --- Analytics -----------------------------------------------------------

    /// Minutes between full analytics refreshes (independent of the
    /// refresh that follows each successful poll).
    #[serde(default = "default_analytics_refresh_minutes")]
    pub analytics_refresh_minutes: u64,

    /// Days of history fed to the engine per report.
    #[serde(default = "default_history_days")]
    pub history_days: i64,

    /// Trailing row-count windows for the moving averages.
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,

    // --- Storage & serving ---------------------------------------------------

    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// HTTP API bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            coins: default_coins(),
            poll_interval_minutes: default_poll_interval_minutes(),
            max_consecutive_failures: default_max_consecutive_failures(),
            analytics_refresh_minutes: default_analytics_refresh_minutes(),
            history_days: default_history_days(),
            ma_windows: default_ma_windows(),
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            coins = config.coins.len(),
            poll_interval_minutes = config.poll_interval_minutes,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
