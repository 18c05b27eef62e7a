//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_rotation_config, DEFAULT_BENCHMARK,
    DEFAULT_INITIAL_CAPITAL, DEFAULT_RISK_FREE_RATE,
};
use crate::domain::error::RotatorError;
use crate::domain::performance::{build_report, BacktestReport};
use crate::domain::price_table::{PriceSeries, PriceTable};
use crate::domain::strategy::{
    Strategy, DEFAULT_ALLOCATION_FRACTION, DEFAULT_ELIGIBLE_COUNT, DEFAULT_LOOKBACK_WINDOW,
    DEFAULT_SELECTED_COUNT,
};
use crate::domain::universe::{parse_symbols, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_OUTPUT_DIR: &str = "./results";

#[derive(Parser, Debug)]
#[command(name = "rotator", about = "Momentum rotation backtester")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the CSV reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            data_dir,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest_command(&config, output.as_deref(), data_dir.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

fn fail(err: RotatorError) -> ExitCode {
    if err.is_invariant_violation() {
        error!(error = %err, "simulation invariant violated");
    }
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn load_validated(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_backtest_config(&adapter).map_err(fail)?;
    validate_rotation_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, RotatorError> {
    Ok(BacktestConfig {
        start_date: parse_date(adapter, "start_date")?,
        end_date: parse_date(adapter, "end_date")?,
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
    })
}

fn get_count(
    adapter: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, RotatorError> {
    let value = adapter.get_int("rotation", key, default as i64);
    usize::try_from(value).map_err(|_| RotatorError::ConfigInvalid {
        section: "rotation".into(),
        key: key.into(),
        reason: format!("{key} must not be negative"),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, RotatorError> {
    let name = adapter
        .get_string("rotation", "name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Strategy::default().name);

    Ok(Strategy {
        name,
        lookback_window: get_count(adapter, "lookback_window", DEFAULT_LOOKBACK_WINDOW)?,
        eligible_count: get_count(adapter, "eligible_count", DEFAULT_ELIGIBLE_COUNT)?,
        selected_count: get_count(adapter, "selected_count", DEFAULT_SELECTED_COUNT)?,
        allocation_fraction: adapter.get_double(
            "rotation",
            "allocation_fraction",
            DEFAULT_ALLOCATION_FRACTION,
        ),
    })
}

pub fn resolve_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, RotatorError> {
    let raw = config
        .get_string("rotation", "symbols")
        .ok_or_else(|| RotatorError::ConfigMissing {
            section: "rotation".into(),
            key: "symbols".into(),
        })?;
    parse_symbols(&raw).map_err(|e| RotatorError::ConfigInvalid {
        section: "rotation".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

pub fn resolve_benchmark(config: &dyn ConfigPort) -> String {
    config
        .get_string("rotation", "benchmark")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string())
}

/// `--data-dir` wins over `[data] path`.
pub fn resolve_data_dir(config: &dyn ConfigPort, data_dir: Option<&Path>) -> PathBuf {
    match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(
            config
                .get_string("data", "path")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        ),
    }
}

/// `--output` wins over `[report] output_dir`.
pub fn resolve_output_dir(config: &dyn ConfigPort, output: Option<&Path>) -> PathBuf {
    match output {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        ),
    }
}

/// Benchmark prices inside the backtest range. A missing benchmark only
/// empties the comparison column; a malformed one is still an error.
fn load_benchmark(
    data_port: &dyn DataPort,
    symbol: &str,
    bt_config: &BacktestConfig,
) -> Result<PriceSeries, RotatorError> {
    match data_port.fetch_closes(symbol, bt_config.start_date, bt_config.end_date) {
        Ok(points) => Ok(PriceSeries::new(symbol, points)),
        Err(RotatorError::NoData { .. }) => {
            warn!(%symbol, "benchmark unavailable");
            Ok(PriceSeries::new(symbol, Vec::new()))
        }
        Err(e) => Err(e),
    }
}

/// Load data, run the backtest and write the reports.
///
/// Only prices inside `[start_date, end_date]` are loaded; the first
/// `lookback_window` rows of that range are momentum warm-up.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    symbols: &[String],
    benchmark: &str,
    output_dir: &Path,
) -> Result<BacktestReport, RotatorError> {
    info!(symbols = symbols.len(), "validating universe");
    let validation = validate_universe(
        data_port,
        symbols.to_vec(),
        benchmark,
        bt_config.start_date,
        bt_config.end_date,
        strategy.min_history(),
    )?;
    info!(symbols = validation.universe.count(), "universe ready");
    for skipped in &validation.skipped {
        eprintln!("  skipped {} ({:?})", skipped.symbol, skipped.reason);
    }

    let table = PriceTable::from_series(validation.series)?;
    info!(
        dates = table.len(),
        symbols = table.symbols().len(),
        "price table built"
    );

    let result = run_backtest(&table, strategy, bt_config)?;
    let benchmark_series = load_benchmark(data_port, benchmark, bt_config)?;
    let report = build_report(&result, &benchmark_series, bt_config.risk_free_rate);

    report_port.write(&report, output_dir)?;
    Ok(report)
}

fn print_summary(report: &BacktestReport) {
    let summary = &report.summary;
    let metrics = &report.metrics;

    eprintln!("\n=== Results ===");
    eprintln!("Final Value:      ${:.2}", summary.final_value);
    eprintln!("Total Profit:     ${:.2}", summary.total_profit);
    eprintln!(
        "{} Return:  {:.2}%",
        report.benchmark, summary.benchmark_return_pct
    );
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Round Trips:      {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Holding:      {:.1} days", metrics.avg_holding_days);
}

fn run_backtest_command(
    config_path: &Path,
    output: Option<&Path>,
    data_dir: Option<&Path>,
) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = build_strategy(&adapter).and_then(|strategy| {
        let bt_config = build_backtest_config(&adapter)?;
        let symbols = resolve_symbols(&adapter)?;
        Ok((strategy, bt_config, symbols))
    });
    let (strategy, bt_config, symbols) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let benchmark = resolve_benchmark(&adapter);
    let data_path = resolve_data_dir(&adapter, data_dir);
    let output_dir = resolve_output_dir(&adapter, output);

    eprintln!("Strategy: {}", strategy.name);
    eprintln!(
        "Running backtest: {} symbols from {}, {} to {}",
        symbols.len(),
        data_path.display(),
        bt_config.start_date,
        bt_config.end_date,
    );

    let data_port = CsvAdapter::new(data_path);
    let report_port = CsvReportAdapter::new();
    match run_backtest_pipeline(
        &data_port,
        &report_port,
        &strategy,
        &bt_config,
        &symbols,
        &benchmark,
        &output_dir,
    ) {
        Ok(report) => {
            print_summary(&report);
            eprintln!("\nReports written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let (strategy, symbols) = match build_strategy(&adapter)
        .and_then(|s| Ok((s, resolve_symbols(&adapter)?)))
    {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    eprintln!("\nStrategy: {}", strategy.name);
    eprintln!("  lookback_window:     {}", strategy.lookback_window);
    eprintln!("  eligible_count:      {}", strategy.eligible_count);
    eprintln!("  selected_count:      {}", strategy.selected_count);
    eprintln!("  allocation_fraction: {}", strategy.allocation_fraction);

    eprintln!("\nUniverse:");
    eprintln!("  symbols:   {}", symbols.join(", "));
    eprintln!("  benchmark: {}", resolve_benchmark(&adapter));
    eprintln!("  data:      {}", resolve_data_dir(&adapter, None).display());

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    eprintln!("  [backtest] ok");
    if let Err(e) = validate_rotation_config(&adapter) {
        return fail(e);
    }
    eprintln!("  [rotation] ok");

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_path = resolve_data_dir(&config, None);
    let adapter = CsvAdapter::new(data_path.clone());

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_path.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => match resolve_symbols(&config) {
            Ok(mut list) => {
                let benchmark = resolve_benchmark(&config);
                if !list.contains(&benchmark) {
                    list.push(benchmark);
                }
                list
            }
            Err(e) => return fail(e),
        },
    };

    let adapter = CsvAdapter::new(resolve_data_dir(&config, None));
    for s in &symbols {
        match adapter.get_data_range(s) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} prices, {} to {}", s, count, first, last);
            }
            Ok(None) => eprintln!("{}: no data found", s),
            Err(e) => eprintln!("error reading {}: {}", s, e),
        }
    }
    ExitCode::SUCCESS
}
