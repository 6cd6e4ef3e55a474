//! Parabolic SAR: Wilder's acceleration factor system.
//!
//! Inherently sequential/stateful: maintains direction, extreme point (EP),
//! and acceleration factor (AF) in a [`SarState`] that is threaded through a
//! single pass over the bars. A fresh state is built for every call to
//! [`ParabolicSar::compute`]; nothing is cached between series.
//!
//! Parameters: step (default 0.02) and max_step (default 0.20). The AF starts
//! at `step`, grows by `step` on every new extreme, and is capped at `max_step`.
//!
//! Unlike a warmup-style indicator, bar 0 already carries a value: the seed
//! SAR (first low in an uptrend, first high in a downtrend).

use serde::{Deserialize, Serialize};

use super::IndicatorError;
use crate::domain::Bar;

/// Direction of the current SAR leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

/// Per-bar snapshot of the engine after processing that bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SarPoint {
    pub sar: f64,
    pub trend: Trend,
    pub extreme_point: f64,
    pub acceleration: f64,
    /// True when this bar flipped the trend.
    pub reversed: bool,
}

/// Mutable recursion state for one series.
#[derive(Debug, Clone)]
pub struct SarState {
    trend: Trend,
    extreme_point: f64,
    acceleration: f64,
    sar: f64,
}

impl SarState {
    /// Seed from the first bar. The initial direction is up when there is no
    /// second bar or when the second close is at or above the first.
    pub fn seed(first: &Bar, second: Option<&Bar>, step: f64) -> Self {
        let trend = match second {
            Some(next) if next.close < first.close => Trend::Down,
            _ => Trend::Up,
        };
        let (sar, extreme_point) = match trend {
            Trend::Up => (first.low, first.high),
            Trend::Down => (first.high, first.low),
        };
        Self {
            trend,
            extreme_point,
            acceleration: step,
            sar,
        }
    }

    /// Advance one bar. `prev1` is the bar immediately before `bar`, `prev2`
    /// the one before that (absent on the second bar of a series).
    pub fn advance(
        &mut self,
        bar: &Bar,
        prev1: &Bar,
        prev2: Option<&Bar>,
        step: f64,
        max_step: f64,
    ) -> bool {
        let mut candidate = self.sar + self.acceleration * (self.extreme_point - self.sar);

        match self.trend {
            Trend::Up => {
                // SAR may not sit above either of the two prior lows.
                candidate = candidate.min(prev1.low);
                if let Some(p2) = prev2 {
                    candidate = candidate.min(p2.low);
                }

                if bar.low < candidate {
                    self.trend = Trend::Down;
                    self.sar = self.extreme_point;
                    self.extreme_point = bar.low;
                    self.acceleration = step;
                    return true;
                }
                if bar.high > self.extreme_point {
                    self.extreme_point = bar.high;
                    self.acceleration = (self.acceleration + step).min(max_step);
                }
            }
            Trend::Down => {
                // SAR may not sit below either of the two prior highs.
                candidate = candidate.max(prev1.high);
                if let Some(p2) = prev2 {
                    candidate = candidate.max(p2.high);
                }

                if bar.high > candidate {
                    self.trend = Trend::Up;
                    self.sar = self.extreme_point;
                    self.extreme_point = bar.high;
                    self.acceleration = step;
                    return true;
                }
                if bar.low < self.extreme_point {
                    self.extreme_point = bar.low;
                    self.acceleration = (self.acceleration + step).min(max_step);
                }
            }
        }

        self.sar = candidate;
        false
    }

    fn snapshot(&self, reversed: bool) -> SarPoint {
        SarPoint {
            sar: self.sar,
            trend: self.trend,
            extreme_point: self.extreme_point,
            acceleration: self.acceleration,
            reversed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParabolicSar {
    step: f64,
    max_step: f64,
}

impl ParabolicSar {
    pub fn new(step: f64, max_step: f64) -> Result<Self, IndicatorError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(IndicatorError::InvalidParameter(format!(
                "SAR step must be a positive finite number, got {step}"
            )));
        }
        if !(max_step.is_finite() && max_step >= step) {
            return Err(IndicatorError::InvalidParameter(format!(
                "SAR max step must be finite and >= step ({step}), got {max_step}"
            )));
        }
        Ok(Self { step, max_step })
    }

    /// Default parameters: 0.02, 0.20
    pub fn default_params() -> Self {
        Self {
            step: 0.02,
            max_step: 0.20,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// SAR value per bar; same length as `bars`.
    pub fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.compute_trace(bars).into_iter().map(|p| p.sar).collect()
    }

    /// Full per-bar engine trace; same length as `bars`.
    pub fn compute_trace(&self, bars: &[Bar]) -> Vec<SarPoint> {
        let Some(first) = bars.first() else {
            return Vec::new();
        };

        let mut state = SarState::seed(first, bars.get(1), self.step);
        let mut trace = Vec::with_capacity(bars.len());
        trace.push(state.snapshot(false));

        for i in 1..bars.len() {
            let prev2 = if i >= 2 { Some(&bars[i - 2]) } else { None };
            let reversed = state.advance(&bars[i], &bars[i - 1], prev2, self.step, self.max_step);
            trace.push(state.snapshot(reversed));
        }

        trace
    }
}

impl Default for ParabolicSar {
    fn default() -> Self {
        Self::default_params()
    }
}
