//! OHLCV bars and the per-ticker price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single ticker over one period (a day, or an N-day bucket
/// after resampling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low >= 0.0
    }
}

/// Ordered daily history for one ticker.
///
/// Dates are strictly increasing and unique; void bars are never present.
/// Construct through [`PriceSeries::from_bars`], which canonicalizes
/// whatever a provider returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Canonicalize raw provider bars: drop void bars, sort by date, and keep
    /// the last record when a date appears more than once.
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.retain(|b| !b.is_void());
        // Stable sort keeps provider order among equal dates, so the
        // dedup below retains the most recent record for each date.
        bars.sort_by_key(|b| b.date);
        let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match out.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => out.push(bar),
            }
        }
        Self { bars: out }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Deterministic BLAKE3 digest over dates and OHLCV values.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
