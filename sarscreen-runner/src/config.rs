//! Serializable screening configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields the standard screen: 5% tolerance over 3, 4 and 5-day bars with
//! Wilder's 0.02 / 0.20 SAR parameters.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sarscreen_core::data::UniverseOptions;
use sarscreen_core::domain::AggregationWindow;
use sarscreen_core::indicators::{IndicatorError, ParabolicSar};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tolerance must be a finite, non-negative percentage, got {0}")]
    InvalidTolerance(f64),

    #[error("at least one aggregation window is required")]
    NoWindows,

    #[error("aggregation window {0} is listed more than once")]
    DuplicateWindow(AggregationWindow),

    #[error(transparent)]
    Sar(#[from] IndicatorError),

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("fetch timeout must be at least 1 second")]
    InvalidTimeout,
}

/// Parabolic SAR parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarParams {
    pub step: f64,
    pub max_step: f64,
}

impl Default for SarParams {
    fn default() -> Self {
        let psar = ParabolicSar::default_params();
        Self {
            step: psar.step(),
            max_step: psar.max_step(),
        }
    }
}

impl SarParams {
    pub fn indicator(&self) -> Result<ParabolicSar, IndicatorError> {
        ParabolicSar::new(self.step, self.max_step)
    }
}

/// Complete screen configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    // ── Signal ──
    pub tolerance_pct: f64,
    pub windows: Vec<AggregationWindow>,

    // ── Threading ──
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,

    // ── Output ──
    pub output_dir: PathBuf,

    // ── Tables (kept last for TOML output) ──
    pub sar: SarParams,
    pub universe: UniverseOptions,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            tolerance_pct: 5.0,
            windows: AggregationWindow::default_set(),
            concurrency: 4,
            fetch_timeout_secs: 60,
            output_dir: PathBuf::from("."),
            sar: SarParams::default(),
            universe: UniverseOptions::default(),
        }
    }
}

impl ScreenConfig {
    /// Load a config from a TOML file. The result is not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance_pct.is_finite() && self.tolerance_pct >= 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance_pct));
        }
        if self.windows.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        let mut seen = HashSet::new();
        for w in &self.windows {
            if !seen.insert(*w) {
                return Err(ConfigError::DuplicateWindow(*w));
            }
        }
        self.sar.indicator()?;
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Deterministic BLAKE3 fingerprint of the screening parameters.
    ///
    /// Covers only what affects the flags (tolerance, windows, SAR), so
    /// two runs with the same fingerprint over the same data agree.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.tolerance_pct.to_le_bytes());
        for w in &self.windows {
            hasher.update(&w.days().to_le_bytes());
        }
        hasher.update(&self.sar.step.to_le_bytes());
        hasher.update(&self.sar.max_step.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
