//! Batch runner: screens a whole universe on a bounded worker pool.
//!
//! Every ticker is isolated: fetch errors, empty history, computation
//! failures and panics end up in that ticker's record and never abort the
//! batch. Records come back in universe order regardless of which worker
//! finished first.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use sarscreen_core::data::{fetch_with_timeout, DataError, DataProvider, UniverseEntry};
use sarscreen_core::domain::{AggregationWindow, PriceSeries};

use crate::config::{ConfigError, ScreenConfig};
use crate::pipeline::{Screener, TickerFailure, TickerOutcome, TickerRecord};

// ─── Progress ────────────────────────────────────────────────────────

/// Progress hooks, called from worker threads.
pub trait BatchProgress: Send + Sync {
    fn on_ticker_start(&self, _index: usize, _total: usize, _ticker: &str) {}

    /// `completed` counts finished tickers including this one.
    fn on_ticker_done(&self, _completed: usize, _total: usize, _record: &TickerRecord) {}

    fn on_batch_done(&self, _summary: &BatchSummary) {}
}

/// Silent progress.
pub struct NoProgress;

impl BatchProgress for NoProgress {}

/// Progress reported as `tracing` events.
pub struct LogProgress;

impl BatchProgress for LogProgress {
    fn on_ticker_start(&self, index: usize, total: usize, ticker: &str) {
        info!(ticker, n = index + 1, total, "processing");
    }

    fn on_ticker_done(&self, completed: usize, total: usize, record: &TickerRecord) {
        if record.error {
            warn!(
                ticker = %record.ticker,
                completed,
                total,
                reason = record.reason.as_deref().unwrap_or(""),
                "failed"
            );
        } else {
            info!(ticker = %record.ticker, completed, total, hit = record.any_hit(), "done");
        }
    }

    fn on_batch_done(&self, summary: &BatchSummary) {
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_secs = summary.elapsed_secs,
            "screen complete"
        );
    }
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Hits for one window across the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCount {
    pub window: AggregationWindow,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subset of `failed` that never started because of cancellation.
    pub cancelled: usize,
    pub hits: Vec<WindowCount>,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

/// Ordered outcome of a batch: one record per universe entry.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub provider: String,
    pub windows: Vec<AggregationWindow>,
    pub records: Vec<TickerRecord>,
    pub summary: BatchSummary,
}

// ─── Runner ──────────────────────────────────────────────────────────

/// Screen every entry with `provider` and return records in input order.
///
/// `concurrency` 1 runs on the caller's thread; larger values build a
/// dedicated rayon pool. Setting `cancel` stops new tickers from starting;
/// those are recorded as failed with reason `cancelled`.
pub fn run_all(
    entries: &[UniverseEntry],
    provider: Arc<dyn DataProvider>,
    config: &ScreenConfig,
    progress: &dyn BatchProgress,
    cancel: Option<&AtomicBool>,
) -> Result<BatchReport, BatchError> {
    let screener = Screener::from_config(config)?;
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let total = entries.len();
    let started_at = Utc::now();
    let start_time = Instant::now();
    let completed = AtomicUsize::new(0);

    info!(
        total,
        provider = provider.name(),
        concurrency = config.concurrency,
        tolerance_pct = config.tolerance_pct,
        "starting screen"
    );

    let mut slots: Vec<Option<TickerRecord>> = (0..total).map(|_| None).collect();

    let work = |(index, slot): (usize, &mut Option<TickerRecord>)| {
        let entry = &entries[index];
        let record = if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            TickerRecord::from_outcome(entry, screener.windows(), &Err(TickerFailure::Cancelled))
        } else {
            progress.on_ticker_start(index, total, &entry.ticker);
            let outcome = screen_entry(entry, &provider, &screener, timeout);
            TickerRecord::from_outcome(entry, screener.windows(), &outcome)
        };
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress.on_ticker_done(done, total, &record);
        *slot = Some(record);
    };

    if config.concurrency > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("sarscreen-worker-{i}"))
            .build()?;
        pool.install(|| slots.par_iter_mut().enumerate().for_each(&work));
    } else {
        slots.iter_mut().enumerate().for_each(&work);
    }

    let records: Vec<TickerRecord> = slots
        .into_iter()
        .zip(entries)
        .map(|(slot, entry)| {
            slot.unwrap_or_else(|| {
                TickerRecord::failed(entry, screener.windows(), "not processed".to_string())
            })
        })
        .collect();

    let summary = summarize(&records, screener.windows(), started_at, start_time.elapsed());
    progress.on_batch_done(&summary);

    Ok(BatchReport {
        provider: provider.name().to_string(),
        windows: screener.windows().to_vec(),
        records,
        summary,
    })
}

/// Fetch and screen one ticker. Panics inside the provider call or the
/// computation are converted into [`TickerFailure::Panicked`]. An
/// unavailable provider fails the ticker without spawning a fetch.
fn screen_entry(
    entry: &UniverseEntry,
    provider: &Arc<dyn DataProvider>,
    screener: &Screener,
    timeout: Duration,
) -> TickerOutcome {
    let attempt = catch_unwind(AssertUnwindSafe(|| -> TickerOutcome {
        if !provider.is_available() {
            return Err(DataError::CircuitBreakerTripped.into());
        }
        let fetched = fetch_with_timeout(Arc::clone(provider), &entry.ticker, timeout)?;
        let series = PriceSeries::from_bars(fetched.bars);
        screener.run_ticker(&entry.ticker, &series)
    }));

    attempt.unwrap_or_else(|payload| Err(TickerFailure::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn summarize(
    records: &[TickerRecord],
    windows: &[AggregationWindow],
    started_at: DateTime<Utc>,
    elapsed: Duration,
) -> BatchSummary {
    let failed = records.iter().filter(|r| r.error).count();
    let cancelled = records
        .iter()
        .filter(|r| r.reason.as_deref() == Some("cancelled"))
        .count();
    let hits = windows
        .iter()
        .map(|&window| WindowCount {
            window,
            hits: records.iter().filter(|r| r.flag(window) == Some(true)).count(),
        })
        .collect();

    BatchSummary {
        total: records.len(),
        succeeded: records.len() - failed,
        failed,
        cancelled,
        hits,
        started_at,
        elapsed_secs: elapsed.as_secs_f64(),
    }
}
