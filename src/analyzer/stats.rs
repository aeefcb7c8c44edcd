//! Rounding and share helpers used by the analytics payloads.

/// Round to 2 decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Share of `count` in `total`, in percent, rounded to 2 decimals.
/// A zero total is treated as 1 so empty result sets yield 0.
pub fn percentage(count: i64, total: i64) -> f64 {
    let denom = if total == 0 { 1 } else { total };
    round2(100.0 * count as f64 / denom as f64)
}

/// Percentages of each value relative to the sum of `values`.
pub fn percentages(values: &[i64]) -> Vec<f64> {
    let total: i64 = values.iter().sum();
    values.iter().map(|v| percentage(*v, total)).collect()
}
