//! SARSCREEN CLI: screen a ticker universe for Parabolic SAR proximity.
//!
//! Commands:
//! - `scan`: fetch history for every ticker, evaluate each N-day window and
//!   write `<date>_<tol>pct.csv` plus a JSON run manifest
//! - `universe`: parse a universe file and list the fetch tickers

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

use sarscreen_core::data::{
    CircuitBreaker, CsvDirProvider, DataProvider, SyntheticProvider, Universe, YahooProvider,
};
use sarscreen_core::domain::AggregationWindow;
use sarscreen_runner::{run_all, save_report, BatchReport, LogProgress, ScreenConfig};

#[derive(Parser)]
#[command(
    name = "sarscreen",
    version,
    about = "SARSCREEN: N-day Parabolic SAR proximity screener"
)]
struct Cli {
    /// Also write logs to this file (appended).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Yahoo Finance chart API.
    Yahoo,
    /// `<data-dir>/<ticker>.csv` files.
    Csv,
    /// Seeded random walk (offline demos).
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen every ticker of a universe file and write the report.
    Scan {
        /// Universe CSV with a header row.
        #[arg(long)]
        universe: PathBuf,

        /// TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum gap between low and SAR, as a percentage of the low.
        #[arg(long)]
        tolerance: Option<f64>,

        /// Aggregation windows in days, e.g. `3,4,5`.
        #[arg(long, value_delimiter = ',')]
        windows: Option<Vec<AggregationWindow>>,

        /// Universe column holding the symbol.
        #[arg(long)]
        symbol_column: Option<String>,

        /// Exchange suffix appended to each symbol (use "" for none).
        #[arg(long)]
        suffix: Option<String>,

        /// Market data source.
        #[arg(long, value_enum, default_value_t = Source::Yahoo)]
        source: Source,

        /// Directory of per-ticker CSV files (required with `--source csv`).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Worker threads.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-ticker fetch timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Directory for the report and manifest.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only screen the first N tickers.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Parse a universe file and print its tickers.
    Universe {
        /// Universe CSV with a header row.
        #[arg(long)]
        universe: PathBuf,

        /// TOML config file (for the universe section).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let (writer, guard) = non_blocking(file);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(None)
    }
}

fn main() {
    let cli = Cli::parse();

    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Scan {
            universe,
            config,
            tolerance,
            windows,
            symbol_column,
            suffix,
            source,
            data_dir,
            concurrency,
            timeout_secs,
            output_dir,
            limit,
        } => {
            let overrides = Overrides {
                tolerance,
                windows,
                symbol_column,
                suffix,
                concurrency,
                timeout_secs,
                output_dir,
            };
            run_scan(&universe, config.as_deref(), overrides, source, data_dir, limit)
        }
        Commands::Universe { universe, config } => run_universe(&universe, config.as_deref()),
    };

    if let Err(err) = result {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

/// Command-line values that take precedence over the config file.
struct Overrides {
    tolerance: Option<f64>,
    windows: Option<Vec<AggregationWindow>>,
    symbol_column: Option<String>,
    suffix: Option<String>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    output_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut ScreenConfig) {
        if let Some(v) = self.tolerance {
            config.tolerance_pct = v;
        }
        if let Some(v) = self.windows {
            config.windows = v;
        }
        if let Some(v) = self.symbol_column {
            config.universe.symbol_column = v;
        }
        if let Some(v) = self.suffix {
            config.universe.exchange_suffix = v;
        }
        if let Some(v) = self.concurrency {
            config.concurrency = v;
        }
        if let Some(v) = self.timeout_secs {
            config.fetch_timeout_secs = v;
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScreenConfig> {
    match path {
        Some(p) => ScreenConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(ScreenConfig::default()),
    }
}

fn build_provider(
    source: Source,
    data_dir: Option<PathBuf>,
    config: &ScreenConfig,
) -> Result<Arc<dyn DataProvider>> {
    let provider: Arc<dyn DataProvider> = match source {
        Source::Yahoo => {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            let request_timeout = Duration::from_secs(config.fetch_timeout_secs);
            Arc::new(YahooProvider::new(breaker, request_timeout)?)
        }
        Source::Csv => {
            let Some(dir) = data_dir else {
                bail!("--data-dir is required with --source csv");
            };
            if !dir.is_dir() {
                bail!("data directory {} does not exist", dir.display());
            }
            Arc::new(CsvDirProvider::new(dir))
        }
        Source::Synthetic => {
            let end = chrono::Local::now().date_naive();
            let start = end - chrono::Duration::days(365 * 5);
            Arc::new(SyntheticProvider::new(start, end))
        }
    };
    Ok(provider)
}

fn run_scan(
    universe_path: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    source: Source,
    data_dir: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let mut universe = Universe::from_path(universe_path, &config.universe)
        .with_context(|| format!("failed to read universe {}", universe_path.display()))?;
    if let Some(n) = limit {
        universe.truncate(n);
    }
    if universe.is_empty() {
        bail!("universe {} has no tickers", universe_path.display());
    }

    let provider = build_provider(source, data_dir, &config)?;
    info!(
        universe = %universe_path.display(),
        tickers = universe.len(),
        source = provider.name(),
        "universe loaded"
    );

    let report = run_all(universe.entries(), provider, &config, &LogProgress, None)?;

    let today = chrono::Local::now().date_naive();
    let paths = save_report(&report, universe.headers(), &config, &config.output_dir, today)?;

    print_summary(&report);
    println!("Report saved to: {}", paths.csv.display());
    println!("Manifest saved to: {}", paths.manifest.display());

    Ok(())
}

fn print_summary(report: &BatchReport) {
    let s = &report.summary;
    println!();
    println!("=== Screen Summary ===");
    println!("Provider:   {}", report.provider);
    println!("Tickers:    {}", s.total);
    println!("Succeeded:  {}", s.succeeded);
    println!("Failed:     {}", s.failed);
    println!("Elapsed:    {:.1}s", s.elapsed_secs);
    for count in &s.hits {
        let tickers: Vec<&str> = report
            .records
            .iter()
            .filter(|r| r.flag(count.window) == Some(true))
            .map(|r| r.ticker.as_str())
            .collect();
        println!("{:<11} {} hit(s) {}", format!("{}:", count.window), count.hits, tickers.join(" "));
    }
    println!();
}

fn run_universe(universe_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = Universe::from_path(universe_path, &config.universe)
        .with_context(|| format!("failed to read universe {}", universe_path.display()))?;

    println!("Columns: {}", universe.headers().join(", "));
    println!("Tickers: {}", universe.len());
    for entry in universe.entries() {
        println!("  {:<16} {}", entry.symbol, entry.ticker);
    }
    Ok(())
}
