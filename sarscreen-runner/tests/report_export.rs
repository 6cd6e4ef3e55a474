//! End-to-end report export: CSV universe + CSV price directory → batch →
//! `<date>_<tol>pct.csv` and its JSON manifest.

mod common;

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use common::reversal_bars;
use sarscreen_core::data::{CsvDirProvider, Universe, UniverseOptions};
use sarscreen_runner::{
    export_csv, import_manifest_json, run_all, save_report, NoProgress, RunManifest,
    ScreenConfig,
};

const UNIVERSE_CSV: &str = "\
Company Name,Industry,Symbol,Series,ISIN Code
Golden Corp,Metals,GOLD,EQ,INE000000001
Missing Ltd,Services,MISSING,EQ,INE000000002
";

fn write_price_file(dir: &Path, ticker: &str) {
    let mut body = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in reversal_bars() {
        body.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), body).unwrap();
}

fn run_fixture(data_dir: &Path) -> (Universe, sarscreen_runner::BatchReport, ScreenConfig) {
    write_price_file(data_dir, "GOLD.NS");
    let universe =
        Universe::from_reader(UNIVERSE_CSV.as_bytes(), &UniverseOptions::default()).unwrap();
    let config = ScreenConfig {
        concurrency: 2,
        ..ScreenConfig::default()
    };
    let report = run_all(
        universe.entries(),
        Arc::new(CsvDirProvider::new(data_dir)),
        &config,
        &NoProgress,
        None,
    )
    .unwrap();
    (universe, report, config)
}

#[test]
fn csv_has_universe_columns_then_derived_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let (universe, report, _) = run_fixture(tmp.path());

    let csv = export_csv(&report, universe.headers()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Company Name,Industry,Symbol,Series,ISIN Code,Ticker,3D_condition,4D_condition,5D_condition,Error"
    );
    assert_eq!(
        lines[1],
        "Golden Corp,Metals,GOLD,EQ,INE000000001,GOLD.NS,1,1,0,0"
    );
    assert_eq!(
        lines[2],
        "Missing Ltd,Services,MISSING,EQ,INE000000002,MISSING.NS,0,0,0,1"
    );
}

#[test]
fn existing_derived_columns_are_overwritten_not_repeated() {
    let tmp = tempfile::tempdir().unwrap();
    write_price_file(tmp.path(), "GOLD.NS");
    let universe = Universe::from_reader(
        "Symbol,Ticker,Error,Sector\nGOLD,GOLD.BO,stale,Metals\n".as_bytes(),
        &UniverseOptions::default(),
    )
    .unwrap();
    let report = run_all(
        universe.entries(),
        Arc::new(CsvDirProvider::new(tmp.path())),
        &ScreenConfig::default(),
        &NoProgress,
        None,
    )
    .unwrap();

    let csv = export_csv(&report, universe.headers()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        [
            "Symbol,Ticker,Error,Sector,3D_condition,4D_condition,5D_condition",
            "GOLD,GOLD.NS,0,Metals,1,1,0",
        ]
    );
}

#[test]
fn save_report_writes_dated_files() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let (universe, report, config) = run_fixture(data.path());
    let date = NaiveDate::from_ymd_opt(2024, 1, 26).unwrap();
    let nested = out.path().join("reports");

    let paths = save_report(&report, universe.headers(), &config, &nested, date).unwrap();

    assert_eq!(paths.csv, nested.join("2024-01-26_5pct.csv"));
    assert_eq!(paths.manifest, nested.join("2024-01-26_5pct.json"));

    let mut reader = csv::Reader::from_path(&paths.csv).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 10);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][5], "GOLD.NS");
    assert_eq!(&rows[1][9], "1");

    let manifest: RunManifest =
        import_manifest_json(&std::fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest.provider, "csv_dir");
    assert_eq!(manifest.tolerance_pct, 5.0);
    assert_eq!(manifest.summary.total, 2);
    assert_eq!(manifest.summary.failed, 1);
    assert_eq!(manifest.failures.len(), 1);
    assert_eq!(manifest.failures[0].ticker, "MISSING.NS");
    assert!(manifest.failures[0].reason.contains("symbol not found"));
    assert_eq!(manifest.config_fingerprint, config.fingerprint());
}

#[test]
fn manifest_rejects_future_schema() {
    let data = tempfile::tempdir().unwrap();
    let (_, report, config) = run_fixture(data.path());
    let mut manifest = RunManifest::new(&report, &config);
    manifest.schema_version = 99;
    let json = serde_json::to_string(&manifest).unwrap();
    assert!(import_manifest_json(&json).is_err());
}

#[test]
fn rerun_overwrites_same_day_report() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let (universe, report, config) = run_fixture(data.path());
    let date = NaiveDate::from_ymd_opt(2024, 1, 26).unwrap();

    let first = save_report(&report, universe.headers(), &config, out.path(), date).unwrap();
    let before = std::fs::read_to_string(&first.csv).unwrap();
    let second = save_report(&report, universe.headers(), &config, out.path(), date).unwrap();
    assert_eq!(first, second);
    assert_eq!(before, std::fs::read_to_string(&second.csv).unwrap());
}
