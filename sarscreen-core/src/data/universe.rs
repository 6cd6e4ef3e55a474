//! Ticker universe: the list of symbols to screen, read from a CSV file.
//!
//! The file needs a header row and one column holding the exchange symbol
//! (`Symbol` by default, as in the NSE index constituent lists). The fetch
//! identifier is the symbol plus an exchange suffix (`.NS` by default). Every
//! original column is retained so the report can reproduce the input rows.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("cannot read universe file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed universe CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("universe has no '{column}' column (found: {available})")]
    MissingColumn { column: String, available: String },
}

/// How to interpret a universe file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseOptions {
    /// Header of the column holding exchange symbols.
    pub symbol_column: String,
    /// Appended to each symbol to form the data-provider identifier.
    pub exchange_suffix: String,
}

impl Default for UniverseOptions {
    fn default() -> Self {
        Self {
            symbol_column: "Symbol".into(),
            exchange_suffix: ".NS".into(),
        }
    }
}

impl UniverseOptions {
    /// Provider identifier for a symbol; a symbol that already carries the
    /// suffix is left alone.
    pub fn fetch_id(&self, symbol: &str) -> String {
        if self.exchange_suffix.is_empty() || symbol.ends_with(&self.exchange_suffix) {
            symbol.to_string()
        } else {
            format!("{symbol}{}", self.exchange_suffix)
        }
    }
}

/// One row of the universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    /// Symbol as written in the file.
    pub symbol: String,
    /// Identifier passed to the data provider.
    pub ticker: String,
    /// All original fields, aligned with [`Universe::headers`].
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    headers: Vec<String>,
    entries: Vec<UniverseEntry>,
}

impl Universe {
    /// Load a universe from a CSV file.
    pub fn from_path(path: &Path, opts: &UniverseOptions) -> Result<Self, UniverseError> {
        let file = std::fs::File::open(path).map_err(|source| UniverseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, opts)
    }

    /// Parse a universe from any CSV source.
    pub fn from_reader<R: Read>(reader: R, opts: &UniverseOptions) -> Result<Self, UniverseError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let symbol_idx = headers
            .iter()
            .position(|h| h == &opts.symbol_column)
            .ok_or_else(|| UniverseError::MissingColumn {
                column: opts.symbol_column.clone(),
                available: headers.join(", "),
            })?;

        let mut entries = Vec::new();
        for (row_no, record) in rdr.records().enumerate() {
            let record = record?;
            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            fields.resize(headers.len(), String::new());

            let symbol = fields[symbol_idx].clone();
            if symbol.is_empty() {
                // +2: header line and 1-based numbering
                warn!(line = row_no + 2, "skipping universe row with blank symbol");
                continue;
            }

            entries.push(UniverseEntry {
                ticker: opts.fetch_id(&symbol),
                symbol,
                fields,
            });
        }

        Ok(Self { headers, entries })
    }

    /// Build a single-column universe from bare symbols.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S], opts: &UniverseOptions) -> Self {
        let entries = symbols
            .iter()
            .map(|s| {
                let symbol = s.as_ref().trim().to_string();
                UniverseEntry {
                    ticker: opts.fetch_id(&symbol),
                    fields: vec![symbol.clone()],
                    symbol,
                }
            })
            .collect();
        Self {
            headers: vec![opts.symbol_column.clone()],
            entries,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the first `n` entries.
    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIFTY_SAMPLE: &str = "\
Company Name,Industry,Symbol,Series,ISIN Code
Reliance Industries Ltd.,Oil Gas & Consumable Fuels,RELIANCE,EQ,INE002A01018
Mahindra & Mahindra Ltd.,Automobile and Auto Components,M&M,EQ,INE101A01026
Infosys Ltd.,Information Technology,INFY,EQ,INE009A01021
";

    #[test]
    fn parses_nifty_style_file() {
        let u = Universe::from_reader(NIFTY_SAMPLE.as_bytes(), &UniverseOptions::default()).unwrap();
        assert_eq!(u.len(), 3);
        assert_eq!(u.headers()[2], "Symbol");
        let tickers: Vec<&str> = u.entries().iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, ["RELIANCE.NS", "M&M.NS", "INFY.NS"]);
        assert_eq!(u.entries()[1].fields[0], "Mahindra & Mahindra Ltd.");
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let opts = UniverseOptions {
            symbol_column: "Ticker".into(),
            ..UniverseOptions::default()
        };
        let err = Universe::from_reader(NIFTY_SAMPLE.as_bytes(), &opts).unwrap_err();
        assert!(matches!(err, UniverseError::MissingColumn { ref column, .. } if column == "Ticker"));
    }

    #[test]
    fn blank_symbols_are_skipped() {
        let csv = "Symbol,Name\nAAA,First\n,Nameless\nBBB,Second\n";
        let u = Universe::from_reader(csv.as_bytes(), &UniverseOptions::default()).unwrap();
        assert_eq!(u.len(), 2);
    }

    #[test]
    fn short_rows_are_padded() {
        let csv = "Symbol,Name,Sector\nAAA\n";
        let u = Universe::from_reader(csv.as_bytes(), &UniverseOptions::default()).unwrap();
        assert_eq!(u.entries()[0].fields, ["AAA", "", ""]);
    }

    #[test]
    fn suffix_is_not_doubled() {
        let opts = UniverseOptions::default();
        assert_eq!(opts.fetch_id("TCS"), "TCS.NS");
        assert_eq!(opts.fetch_id("TCS.NS"), "TCS.NS");
        let bare = UniverseOptions {
            exchange_suffix: String::new(),
            ..UniverseOptions::default()
        };
        assert_eq!(bare.fetch_id("SPY"), "SPY");
    }

    #[test]
    fn from_symbols_and_truncate() {
        let mut u = Universe::from_symbols(&["AAA", "BBB", "CCC"], &UniverseOptions::default());
        assert_eq!(u.headers(), ["Symbol"]);
        u.truncate(2);
        assert_eq!(u.len(), 2);
        assert_eq!(u.entries()[1].ticker, "BBB.NS");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Universe::from_path(Path::new("/definitely/not/here.csv"), &UniverseOptions::default())
            .unwrap_err();
        assert!(matches!(err, UniverseError::Io { .. }));
    }
}
