//! Small numeric helpers shared by enrichment and scoring.
//!
//! SMA(n) over a slice uses its last n values.
//! ROC(prev, curr) = ((curr - prev) / prev) * 100, or 0 when prev <= 0.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    mean(&values[values.len() - period..])
}

pub fn rate_of_change(prev: f64, curr: f64) -> f64 {
    if prev > 0.0 {
        ((curr - prev) / prev) * 100.0
    } else {
        0.0
    }
}

/// Mean of |v[k] - v[k-1]| across consecutive values.
pub fn mean_abs_change(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    Some(total / (values.len() - 1) as f64)
}
