// =============================================================================
// Series — validated, time-ordered observations for one instrument
// =============================================================================
//
// A `Series` is the indicator engine's only input. Construction enforces the
// caller contract: timestamps non-decreasing, prices finite. Violations are a
// programmer error on the producing side (the store returns rows ordered by
// timestamp), so `Series::new` fails fast instead of letting the indicator
// math silently produce garbage.
//
// Equal timestamps are allowed and are not deduplicated.
// =============================================================================

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::types::Observation;

/// Time-ordered observations for exactly one symbol.
///
/// Owned for the duration of one computation; never mutated after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Build a series from rows already sorted ascending by timestamp.
    ///
    /// # Errors
    /// - A timestamp earlier than its predecessor.
    /// - A non-finite price (NaN or infinity).
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if !obs.price.is_finite() {
                bail!(
                    "non-finite price {} for {} at index {i}",
                    obs.price,
                    obs.symbol
                );
            }
            if i > 0 && obs.timestamp < observations[i - 1].timestamp {
                bail!(
                    "timestamps not ascending for {}: index {i} ({}) precedes index {} ({})",
                    obs.symbol,
                    obs.timestamp,
                    i - 1,
                    observations[i - 1].timestamp
                );
            }
        }
        Ok(Self { observations })
    }

    /// An empty series (every metric computed from it is unavailable).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// All observations, ascending by timestamp.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The most recent observation, if any.
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Closing prices in series order.
    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    /// The contiguous tail of observations with `timestamp >= since`.
    ///
    /// Because the series is ordered, the qualifying rows are always a
    /// suffix; `partition_point` finds the boundary without a scan-and-copy.
    pub fn since(&self, since: DateTime<Utc>) -> &[Observation] {
        let start = self.observations.partition_point(|o| o.timestamp < since);
        &self.observations[start..]
    }
}
