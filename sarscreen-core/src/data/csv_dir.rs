//! CSV directory provider: offline history from `<dir>/<symbol>.csv`.
//!
//! Expected header: `Date,Open,High,Low,Close,Volume` (lower-case names are
//! accepted too). Extra columns such as `Adj Close` are ignored. Volume may be
//! written as a float, as spreadsheet exports often do.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(&self, symbol: &str) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row?;
            bars.push(Bar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row
                    .volume
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map_or(0, |v| v.round() as u64),
            });
        }

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}
