// =============================================================================
// Relative Strength Index (RSI) — trailing simple-average form
// =============================================================================
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split into gains (`delta` if positive else 0) and losses
//          (`-delta` if negative else 0).
// Step 3 — avg_gain / avg_loss = simple mean over the trailing `period`
//          deltas (no exponential smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero-denominator convention: a window with `avg_loss == 0` (no down moves,
// or no moves at all) has no defined RS — the result is `None`, never 100
// and never a propagated infinity.
// =============================================================================

/// RSI of the most recent `period` deltas.
///
/// # Edge cases
/// - `period == 0` => `None`
/// - `closes.len() < period + 1` => `None` (need `period` trailing deltas)
/// - `avg_loss == 0` => `None` (pinned zero-loss convention, see above)
/// - Non-finite result => `None`
pub fn current_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    // Trailing `period` deltas come from the last `period + 1` closes.
    let tail = &closes[closes.len() - period - 1..];
    let (sum_gain, sum_loss) = tail.windows(2).fold((0.0_f64, 0.0_f64), |(g, l), w| {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });

    let period_f = period as f64;
    rsi_from_averages(sum_gain / period_f, sum_loss / period_f)
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return None;
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    rsi.is_finite().then_some(rsi)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(current_rsi(&[], 14).is_none());
    }

    #[test]
    fn rsi_period_zero() {
        assert!(current_rsi(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn rsi_insufficient_data() {
        // Need period+1 closes (period deltas). 14 closes => 13 deltas < 14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(current_rsi(&closes, 14).is_none());
    }

    #[test]
    fn rsi_all_gains_is_unavailable() {
        // Strictly ascending prices => avg_loss == 0 => pinned to None.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert!(current_rsi(&closes, 14).is_none());
    }

    #[test]
    fn rsi_flat_market_is_unavailable() {
        // No movement at all is also the zero-loss case.
        let closes = vec![100.0; 20];
        assert!(current_rsi(&closes, 14).is_none());
    }

    #[test]
    fn rsi_all_losses() {
        // Strictly descending prices => avg_gain == 0 => RSI = 0.
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let rsi = current_rsi(&closes, 14).unwrap();
        assert!(rsi.abs() < 1e-10, "expected 0.0, got {rsi}");
    }

    #[test]
    fn rsi_known_value() {
        // Classic 14-period dataset: sum of gains 3.06, sum of losses 2.83,
        // RSI = 100 * 3.06 / (3.06 + 2.83) = 51.95...
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57,
        ];
        let rsi = current_rsi(&closes, 14).unwrap();
        assert!((rsi - 51.95).abs() < 0.01, "got {rsi}");
    }

    #[test]
    fn rsi_range_check() {
        // Arbitrary data — whenever defined, RSI must be in [0, 100].
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for end in 15..=closes.len() {
            if let Some(rsi) = current_rsi(&closes[..end], 14) {
                assert!((0.0..=100.0).contains(&rsi), "RSI {rsi} out of range");
            }
        }
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // A huge move older than the trailing 14 deltas must not affect RSI.
        let mut a: Vec<f64> = vec![1000.0, 10.0];
        let mut b: Vec<f64> = vec![10.0, 10.0];
        let tail: Vec<f64> = (1..=15).map(|x| 10.0 + (x % 3) as f64).collect();
        a.extend(&tail);
        b.extend(&tail);
        assert_eq!(current_rsi(&a, 14), current_rsi(&b, 14));
    }
}
