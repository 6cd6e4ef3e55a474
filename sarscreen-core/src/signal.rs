//! SAR proximity signal.
//!
//! A bar qualifies when the SAR sits below its low (bullish posture) and the
//! gap between the two is within `tolerance_pct` percent of the low.

use crate::domain::Bar;

/// True iff `low > sar` and `low - sar <= tolerance_pct / 100 * low`.
///
/// Non-finite inputs never qualify: every comparison against NaN is false.
pub fn evaluate(low: f64, sar: f64, tolerance_pct: f64) -> bool {
    low > sar && (low - sar) <= (tolerance_pct / 100.0) * low
}

/// Evaluate the rule on the last bar of a series and its matching SAR value.
///
/// Returns false for an empty series, and for mismatched slices whose last
/// elements do not line up.
pub fn evaluate_last(bars: &[Bar], sar: &[f64], tolerance_pct: f64) -> bool {
    if bars.len() != sar.len() {
        return false;
    }
    match (bars.last(), sar.last()) {
        (Some(bar), Some(&value)) => evaluate(bar.low, value, tolerance_pct),
        _ => false,
    }
}
