//! Per-ticker pipeline: resample → Parabolic SAR → proximity signal, once
//! per configured window.
//!
//! Windows are independent. A window whose computation fails is reported as
//! a [`ComputeError`] and leaves its flag false; the remaining windows still
//! run. Failures that affect the whole ticker (no data, fetch error, panic)
//! are a [`TickerFailure`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use sarscreen_core::data::{DataError, UniverseEntry};
use sarscreen_core::domain::{AggregationWindow, Bar, PriceSeries};
use sarscreen_core::indicators::ParabolicSar;
use sarscreen_core::resample::aggregate;
use sarscreen_core::signal::evaluate_last;

use crate::config::{ConfigError, ScreenConfig};

/// Failure of a single window's computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("{window}: non-finite price in bar dated {date}")]
    NonFinitePrice {
        window: AggregationWindow,
        date: NaiveDate,
    },

    #[error("{window}: SAR diverged at bar dated {date}")]
    NonFiniteSar {
        window: AggregationWindow,
        date: NaiveDate,
    },
}

/// Failure that takes out the whole ticker.
#[derive(Debug, Error)]
pub enum TickerFailure {
    #[error("no price history")]
    DataUnavailable,

    #[error(transparent)]
    Fetch(#[from] DataError),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("cancelled")]
    Cancelled,
}

/// Result of one window on one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSignal {
    pub window: AggregationWindow,
    pub flag: bool,
    /// Number of resampled bars.
    pub bars: usize,
    pub last_low: Option<f64>,
    pub last_sar: Option<f64>,
}

/// Everything computed for one ticker with usable history.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSignals {
    pub daily_bars: usize,
    pub last_date: Option<NaiveDate>,
    pub data_hash: String,
    /// One entry per configured window, in configuration order.
    pub windows: Vec<Result<WindowSignal, ComputeError>>,
}

impl TickerSignals {
    pub fn has_errors(&self) -> bool {
        self.windows.iter().any(|w| w.is_err())
    }
}

pub type TickerOutcome = Result<TickerSignals, TickerFailure>;

/// Validated screening parameters, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct Screener {
    windows: Vec<AggregationWindow>,
    psar: ParabolicSar,
    tolerance_pct: f64,
}

impl Screener {
    pub fn new(windows: Vec<AggregationWindow>, psar: ParabolicSar, tolerance_pct: f64) -> Self {
        Self {
            windows,
            psar,
            tolerance_pct,
        }
    }

    pub fn from_config(config: &ScreenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.windows.clone(),
            config.sar.indicator()?,
            config.tolerance_pct,
        ))
    }

    pub fn windows(&self) -> &[AggregationWindow] {
        &self.windows
    }

    pub fn tolerance_pct(&self) -> f64 {
        self.tolerance_pct
    }

    /// Run every configured window over one ticker's daily history.
    pub fn run_ticker(&self, ticker: &str, series: &PriceSeries) -> TickerOutcome {
        if series.is_empty() {
            return Err(TickerFailure::DataUnavailable);
        }

        let windows = self
            .windows
            .iter()
            .map(|&window| {
                let result = self.run_window(window, series.bars());
                match &result {
                    Ok(signal) => debug!(
                        ticker,
                        window = %window,
                        bars = signal.bars,
                        flag = signal.flag,
                        "window evaluated"
                    ),
                    Err(e) => debug!(ticker, window = %window, error = %e, "window failed"),
                }
                result
            })
            .collect();

        Ok(TickerSignals {
            daily_bars: series.len(),
            last_date: series.last_date(),
            data_hash: series.content_hash(),
            windows,
        })
    }

    fn run_window(
        &self,
        window: AggregationWindow,
        daily: &[Bar],
    ) -> Result<WindowSignal, ComputeError> {
        let resampled = aggregate(daily, window);

        if let Some(bad) = resampled.iter().find(|b| {
            !(b.open.is_finite() && b.high.is_finite() && b.low.is_finite() && b.close.is_finite())
        }) {
            return Err(ComputeError::NonFinitePrice {
                window,
                date: bad.date,
            });
        }

        let sar = self.psar.compute(&resampled);
        if let Some(i) = sar.iter().position(|v| !v.is_finite()) {
            return Err(ComputeError::NonFiniteSar {
                window,
                date: resampled[i].date,
            });
        }

        Ok(WindowSignal {
            window,
            flag: evaluate_last(&resampled, &sar, self.tolerance_pct),
            bars: resampled.len(),
            last_low: resampled.last().map(|b| b.low),
            last_sar: sar.last().copied(),
        })
    }
}

/// Flag for one window in a finished record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlag {
    pub window: AggregationWindow,
    pub hit: bool,
}

/// Finalized per-ticker row of the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub symbol: String,
    pub ticker: String,
    /// The universe row this record came from, column for column.
    pub fields: Vec<String>,
    pub flags: Vec<WindowFlag>,
    pub error: bool,
    pub reason: Option<String>,
    pub daily_bars: usize,
    pub last_date: Option<NaiveDate>,
    pub data_hash: Option<String>,
}

impl TickerRecord {
    pub fn from_outcome(
        entry: &UniverseEntry,
        windows: &[AggregationWindow],
        outcome: &TickerOutcome,
    ) -> Self {
        match outcome {
            Ok(signals) => {
                let flags = windows
                    .iter()
                    .zip(&signals.windows)
                    .map(|(&window, result)| WindowFlag {
                        window,
                        hit: result.as_ref().map(|s| s.flag).unwrap_or(false),
                    })
                    .collect();
                let errors: Vec<String> = signals
                    .windows
                    .iter()
                    .filter_map(|r| r.as_ref().err().map(ToString::to_string))
                    .collect();
                Self {
                    symbol: entry.symbol.clone(),
                    ticker: entry.ticker.clone(),
                    fields: entry.fields.clone(),
                    flags,
                    error: !errors.is_empty(),
                    reason: (!errors.is_empty()).then(|| errors.join("; ")),
                    daily_bars: signals.daily_bars,
                    last_date: signals.last_date,
                    data_hash: Some(signals.data_hash.clone()),
                }
            }
            Err(failure) => Self::failed(entry, windows, failure.to_string()),
        }
    }

    /// A record with every window false and the error flag set.
    pub fn failed(entry: &UniverseEntry, windows: &[AggregationWindow], reason: String) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            ticker: entry.ticker.clone(),
            fields: entry.fields.clone(),
            flags: windows
                .iter()
                .map(|&window| WindowFlag { window, hit: false })
                .collect(),
            error: true,
            reason: Some(reason),
            daily_bars: 0,
            last_date: None,
            data_hash: None,
        }
    }

    pub fn flag(&self, window: AggregationWindow) -> Option<bool> {
        self.flags.iter().find(|f| f.window == window).map(|f| f.hit)
    }

    pub fn any_hit(&self) -> bool {
        self.flags.iter().any(|f| f.hit)
    }
}
