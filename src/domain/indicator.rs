//! Rolling indicator calculations over closing prices.

/// Simple moving average over `period` closes.
///
/// The first `period - 1` slots are `None` (warm-up). A zero period yields
/// all `None` rather than dividing by zero.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut results: Vec<Option<f64>> = Vec::with_capacity(closes.len());
    let mut window_sum = 0.0_f64;

    for (i, &close) in closes.iter().enumerate() {
        window_sum += close;
        if i >= period {
            window_sum -= closes[i - period];
        }
        if i + 1 >= period {
            results.push(Some(window_sum / period as f64));
        } else {
            results.push(None);
        }
    }

    results
}
