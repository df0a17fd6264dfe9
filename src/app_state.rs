// =============================================================================
// Central Application State — CoinPulse service
// =============================================================================
//
// Shared by the API handlers and the scheduler tasks via `Arc<AppState>`.
// The poller owns its retry counters as task-local state; what lives here is
// only the published snapshot the status endpoint reads.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::runtime_config::RuntimeConfig;
use crate::store::PriceStore;

// =============================================================================
// Poller Status
// =============================================================================

/// Snapshot of the polling loop's health, published after every cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollerStatus {
    /// Fetch failures since startup.
    pub total_failures: u64,
    /// Current run of back-to-back failures.
    pub consecutive_failures: u32,
    /// When the last poll cycle started.
    pub last_run: Option<DateTime<Utc>>,
    /// When a poll last stored data successfully.
    pub last_success: Option<DateTime<Utc>>,
    /// The most recent fetch error, cleared on success.
    pub last_error: Option<String>,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across the async tasks.
pub struct AppState {
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub store: Arc<PriceStore>,
    pub poller_status: RwLock<PollerStatus>,
    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState`. The returned value is typically wrapped
    /// in `Arc` immediately.
    pub fn new(config: RuntimeConfig, store: Arc<PriceStore>) -> Self {
        Self {
            runtime_config: Arc::new(RwLock::new(config)),
            store,
            poller_status: RwLock::new(PollerStatus::default()),
            start_time: std::time::Instant::now(),
        }
    }

    /// Seconds since startup.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Replace the published poller snapshot.
    pub fn set_poller_status(&self, status: PollerStatus) {
        *self.poller_status.write() = status;
    }
}
