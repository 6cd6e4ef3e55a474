//! Aggregation window: the N in "N-day bar".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Number of calendar days merged into one resampled bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AggregationWindow(NonZeroU32);

impl AggregationWindow {
    /// Returns `None` for a zero-day window.
    pub fn new(days: u32) -> Option<Self> {
        NonZeroU32::new(days).map(Self)
    }

    pub fn days(self) -> u32 {
        self.0.get()
    }

    /// Report column name for this window, e.g. `3D_condition`.
    pub fn column_name(self) -> String {
        format!("{}D_condition", self.days())
    }

    /// The default screening set: 3, 4 and 5 days.
    pub fn default_set() -> Vec<Self> {
        [3, 4, 5].into_iter().filter_map(Self::new).collect()
    }
}

impl fmt::Display for AggregationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.days())
    }
}

impl TryFrom<u32> for AggregationWindow {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days).ok_or_else(|| "aggregation window must be at least 1 day".to_string())
    }
}

impl From<AggregationWindow> for u32 {
    fn from(w: AggregationWindow) -> Self {
        w.days()
    }
}

impl FromStr for AggregationWindow {
    type Err = String;

    /// Accepts `3` or `3D`/`3d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('D')
            .or_else(|| trimmed.strip_suffix('d'))
            .unwrap_or(trimmed);
        let days: u32 = digits
            .parse()
            .map_err(|e| format!("invalid aggregation window '{s}': {e}"))?;
        Self::try_from(days)
    }
}
