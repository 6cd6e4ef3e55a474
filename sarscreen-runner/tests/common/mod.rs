//! Shared fixtures for runner integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};
use sarscreen_core::data::{DataError, DataProvider, DataSource, FetchResult};
use sarscreen_core::domain::Bar;

/// 20 sessions: eight down days, ten up days, a two-day gap down.
pub const REVERSAL_CLOSES: [f64; 20] = [
    110.0, 108.0, 105.0, 102.0, 99.0, 96.0, 93.0, 90.0, 92.0, 95.0, 98.0, 101.0, 104.0, 107.0,
    110.0, 111.0, 112.0, 113.0, 96.0, 97.0,
];

/// Weekday bars from 2024-01-01; open = previous close, one-point wicks.
pub fn reversal_bars() -> Vec<Bar> {
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut prev: Option<f64> = None;
    let mut bars = Vec::new();
    for &close in &REVERSAL_CLOSES {
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += chrono::Duration::days(1);
        }
        let open = prev.unwrap_or(close);
        bars.push(Bar {
            date,
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: 1000,
        });
        prev = Some(close);
        date += chrono::Duration::days(1);
    }
    bars
}

/// Scripted response for one ticker.
#[derive(Clone)]
pub enum Script {
    Bars(Vec<Bar>),
    Empty,
    Fail,
    Panic,
    Sleep(Duration),
    /// Return the bars, then raise the shared cancel flag.
    BarsThenCancel(Vec<Bar>, Arc<AtomicBool>),
}

/// In-memory provider answering from a per-ticker script. Unknown tickers
/// are `SymbolNotFound`.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    blocked: bool,
    fetches: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ticker: &str, script: Script) -> Self {
        self.scripts.insert(ticker.to_string(), script);
        self
    }

    /// Report the provider as unavailable, like a tripped circuit breaker.
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    /// Number of `fetch` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str) -> Result<FetchResult, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let ok = |bars: Vec<Bar>| FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        };
        match self.scripts.get(symbol) {
            Some(Script::Bars(bars)) => Ok(ok(bars.clone())),
            Some(Script::Empty) => Ok(ok(Vec::new())),
            Some(Script::Fail) => Err(DataError::NetworkUnreachable("connection refused".into())),
            Some(Script::Panic) => panic!("scripted panic for {symbol}"),
            Some(Script::Sleep(d)) => {
                std::thread::sleep(*d);
                Ok(ok(Vec::new()))
            }
            Some(Script::BarsThenCancel(bars, flag)) => {
                flag.store(true, Ordering::SeqCst);
                Ok(ok(bars.clone()))
            }
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        !self.blocked
    }
}
