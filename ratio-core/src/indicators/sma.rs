//! Simple Moving Average (SMA) over a most-recent-first series.
//!
//! The window covers indices `0..period`, i.e. the latest `period` values.

/// Mean of the most recent `period` values.
///
/// Returns `None` if `period` is zero or the series is shorter than `period`.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: f64 = values[..period].iter().sum();
    Some(sum / period as f64)
}
