// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean over a trailing row-count window:
//   SMA_t = (close_{t-period+1} + ... + close_t) / period
//
// The window counts observations, not wall-clock time — with one observation
// per day, a 7-row window is a 7-day average.
// =============================================================================

/// Compute the full SMA series for the given `closes` and `period`.
///
/// The returned vector has one value per close starting at index
/// `period - 1` (the first full window).
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period` => empty vec
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    closes
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Return the mean of the most recent `period` closes.
///
/// `None` when fewer than `period` closes exist.
pub fn current_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    mean.is_finite().then_some(mean)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- calculate_sma ---------------------------------------------------

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        assert!(calculate_sma(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn sma_insufficient_data() {
        assert!(calculate_sma(&[1.0, 2.0], 5).is_empty());
    }

    #[test]
    fn sma_known_values() {
        // 3-period SMA of [1..6]: [2, 3, 4, 5]
        let closes: Vec<f64> = (1..=6).map(|x| x as f64).collect();
        let sma = calculate_sma(&closes, 3);
        assert_eq!(sma.len(), 4);
        for (got, want) in sma.iter().zip([2.0, 3.0, 4.0, 5.0]) {
            assert!((got - want).abs() < 1e-10, "got {got}, expected {want}");
        }
    }

    // ---- current_sma -----------------------------------------------------

    #[test]
    fn current_sma_uses_trailing_window() {
        // Last 7 of the 8-point series; mean = 753/7 = 107.571428...
        let closes = [100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 112.0, 115.0];
        let sma = current_sma(&closes, 7).unwrap();
        assert!((sma - 753.0 / 7.0).abs() < 1e-10);
    }

    #[test]
    fn current_sma_period_equals_length() {
        let sma = current_sma(&[2.0, 4.0, 6.0], 3).unwrap();
        assert!((sma - 4.0).abs() < 1e-10);
    }

    #[test]
    fn current_sma_none_on_short_input() {
        assert!(current_sma(&[1.0, 2.0], 3).is_none());
        assert!(current_sma(&[], 1).is_none());
    }
}
