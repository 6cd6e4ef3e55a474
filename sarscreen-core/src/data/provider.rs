//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, a
//! directory of CSV files, synthetic bars) so the screener can swap
//! implementations and mock them in tests.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("fetch for '{symbol}' timed out after {timeout_secs}s")]
    Timeout { symbol: String, timeout_secs: u64 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Trait for data providers (Yahoo Finance, CSV import, etc).
///
/// Implementations must tolerate concurrent `fetch` calls from the batch
/// runner's worker pool.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch all available daily OHLCV bars for a symbol.
    ///
    /// An `Ok` result may still carry zero bars; callers treat that the same
    /// as missing data.
    fn fetch(&self, symbol: &str) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    ///
    /// The batch runner skips the fetch for a ticker while this is `false`.
    fn is_available(&self) -> bool {
        true
    }
}

/// Run `provider.fetch` on a detached thread and give up after `timeout`.
///
/// A call that outlives the deadline keeps running in the background until
/// the provider returns; its result is discarded.
pub fn fetch_with_timeout(
    provider: Arc<dyn DataProvider>,
    symbol: &str,
    timeout: Duration,
) -> Result<FetchResult, DataError> {
    let (tx, rx) = mpsc::channel();
    let owned = symbol.to_string();

    std::thread::Builder::new()
        .name(format!("fetch-{symbol}"))
        .spawn(move || {
            // Receiver may already be gone after a timeout.
            let _ = tx.send(provider.fetch(&owned));
        })
        .map_err(|e| DataError::Other(format!("failed to spawn fetch thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(DataError::Timeout {
            symbol: symbol.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(DataError::Other(format!(
            "provider terminated without a result for {symbol}"
        ))),
    }
}
