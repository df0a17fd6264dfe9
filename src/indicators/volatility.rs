// =============================================================================
// Volatility — scaled standard deviation of period returns
// =============================================================================
//
// Step 1 — period-over-period returns: r_i = p_i / p_{i-1} - 1
// Step 2 — sample standard deviation of the returns (n - 1 divisor)
// Step 3 — scale by sqrt(24) and express as a percentage
//
// The caller restricts the input to the reporting window (e.g. the last 7
// days of closes) before calling; this function sees only the window.
// =============================================================================

/// Volatility of the given window of closes, as a percentage.
///
/// # Edge cases
/// - Fewer than 3 closes (i.e. fewer than 2 returns) => `None` — a sample
///   standard deviation over one return is undefined.
/// - A zero close anywhere but the last position => `None` (the next return
///   would divide by it).
/// - Constant closes => `Some(0.0)` exactly.
pub fn window_volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < 3 {
        return None;
    }

    let mut returns = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        if pair[0] == 0.0 {
            return None;
        }
        returns.push(pair[1] / pair[0] - 1.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let volatility = variance.sqrt() * 24.0_f64.sqrt() * 100.0;

    volatility.is_finite().then_some(volatility)
}
