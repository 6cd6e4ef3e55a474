//! Indicator implementations.
//!
//! The screener needs a single trend indicator, the Parabolic SAR. It is a
//! pure function of the bar slice it is given: bars in, one value per bar out.

pub mod parabolic_sar;

pub use parabolic_sar::{ParabolicSar, SarPoint, SarState, Trend};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("invalid indicator parameter: {0}")]
    InvalidParameter(String),
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
