//! SARSCREEN Runner: screen orchestration on top of `sarscreen-core`.
//!
//! This crate provides:
//! - TOML screening configuration with validation
//! - The per-ticker pipeline (resample → SAR → signal for every window)
//! - The batch runner (bounded worker pool, per-ticker failure isolation,
//!   timeouts, cancellation, progress hooks)
//! - CSV report and JSON run-manifest export

pub mod batch;
pub mod config;
pub mod pipeline;
pub mod report;

pub use batch::{
    run_all, BatchError, BatchProgress, BatchReport, BatchSummary, LogProgress, NoProgress,
    WindowCount,
};
pub use config::{ConfigError, SarParams, ScreenConfig};
pub use pipeline::{
    ComputeError, Screener, TickerFailure, TickerOutcome, TickerRecord, TickerSignals,
    WindowFlag, WindowSignal,
};
pub use report::{
    export_csv, export_manifest_json, import_manifest_json, report_stem, save_report, write_csv,
    ReportPaths, RunManifest,
};
