//! Report export: the screen CSV and its JSON run manifest.
//!
//! CSV columns: every universe column in its original order, then `Ticker`,
//! one `<N>D_condition` column per window (`1`/`0`), then `Error` (`1`/`0`).
//! A universe column that already carries one of those names is overwritten
//! in place rather than repeated.
//! Files are named `<YYYY-MM-DD>_<tolerance>pct.csv`; the manifest shares the
//! stem with a `.json` extension.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sarscreen_core::domain::AggregationWindow;

use crate::batch::{BatchReport, BatchSummary};
use crate::config::{SarParams, ScreenConfig};

pub const SCHEMA_VERSION: u32 = 1;

// ─── File naming ────────────────────────────────────────────────────

/// `2024-03-15_5pct`, `2024-03-15_2.5pct`.
pub fn report_stem(date: NaiveDate, tolerance_pct: f64) -> String {
    format!("{}_{}pct", date.format("%Y-%m-%d"), tolerance_label(tolerance_pct))
}

/// At most six decimals, trailing zeros dropped.
fn tolerance_label(tolerance_pct: f64) -> String {
    let fixed = format!("{tolerance_pct:.6}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        t => t.to_string(),
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

fn flag(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

/// Write the screen table to any writer.
pub fn write_csv<W: Write>(report: &BatchReport, headers: &[String], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut derived: Vec<String> = Vec::with_capacity(report.windows.len() + 2);
    derived.push("Ticker".to_string());
    derived.extend(report.windows.iter().map(|w| w.column_name()));
    derived.push("Error".to_string());

    let mut header: Vec<String> = headers.to_vec();
    let slots: Vec<usize> = derived
        .iter()
        .map(|name| match header.iter().position(|h| h == name) {
            Some(i) => i,
            None => {
                header.push(name.clone());
                header.len() - 1
            }
        })
        .collect();
    wtr.write_record(&header)?;

    for rec in &report.records {
        let mut row: Vec<String> = rec.fields.clone();
        // Derived columns must stay under their headers.
        row.resize(headers.len(), String::new());
        row.resize(header.len(), String::new());

        let values = std::iter::once(rec.ticker.clone())
            .chain(
                report
                    .windows
                    .iter()
                    .map(|w| flag(rec.flag(*w).unwrap_or(false)).to_string()),
            )
            .chain(std::iter::once(flag(rec.error).to_string()));
        for (slot, value) in slots.iter().zip(values) {
            row[*slot] = value;
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render the screen table as a CSV string.
pub fn export_csv(report: &BatchReport, headers: &[String]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(report, headers, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not valid UTF-8")
}

// ─── Run manifest ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureNote {
    pub ticker: String,
    pub reason: String,
}

/// Everything needed to reproduce and audit a screen run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub config_fingerprint: String,
    pub provider: String,
    pub tolerance_pct: f64,
    pub windows: Vec<AggregationWindow>,
    pub sar: SarParams,
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub summary: BatchSummary,
    pub failures: Vec<FailureNote>,
}

impl RunManifest {
    pub fn new(report: &BatchReport, config: &ScreenConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            config_fingerprint: config.fingerprint(),
            provider: report.provider.clone(),
            tolerance_pct: config.tolerance_pct,
            windows: report.windows.clone(),
            sar: config.sar,
            concurrency: config.concurrency,
            fetch_timeout_secs: config.fetch_timeout_secs,
            summary: report.summary.clone(),
            failures: report
                .records
                .iter()
                .filter(|r| r.error)
                .map(|r| FailureNote {
                    ticker: r.ticker.clone(),
                    reason: r.reason.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

pub fn export_manifest_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize run manifest to JSON")
}

/// Parse a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize run manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Artifact writer ────────────────────────────────────────────────

/// Paths of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub manifest: PathBuf,
}

/// Write `<stem>.csv` and `<stem>.json` into `output_dir`, creating it if
/// needed. Existing files for the same date and tolerance are overwritten.
pub fn save_report(
    report: &BatchReport,
    headers: &[String],
    config: &ScreenConfig,
    output_dir: &Path,
    date: NaiveDate,
) -> Result<ReportPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let stem = report_stem(date, config.tolerance_pct);
    let paths = ReportPaths {
        csv: output_dir.join(format!("{stem}.csv")),
        manifest: output_dir.join(format!("{stem}.json")),
    };

    let file = std::fs::File::create(&paths.csv)
        .with_context(|| format!("failed to create {}", paths.csv.display()))?;
    write_csv(report, headers, std::io::BufWriter::new(file))
        .with_context(|| format!("failed to write {}", paths.csv.display()))?;

    let manifest = export_manifest_json(&RunManifest::new(report, config))?;
    std::fs::write(&paths.manifest, manifest)
        .with_context(|| format!("failed to write {}", paths.manifest.display()))?;

    Ok(paths)
}
