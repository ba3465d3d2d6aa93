//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::console_summary;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{collect_trades, run_backtest, BacktestConfig, BacktestResult};
use crate::domain::capital::{CapitalConfig, DEFAULT_COLLATERAL_RATIO, DEFAULT_INITIAL_CAPITAL};
use crate::domain::config_validation::validate_config;
use crate::domain::error::BacktestError;
use crate::domain::exit::{ExitPolicy, DEFAULT_MAX_WAIT, DEFAULT_TICK_THRESHOLD};
use crate::domain::trade::TradeLedger;
use crate::domain::universe::{load_universe, UniverseLoad};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_INPUT_DIR: &str = "data/rsi_macd";

#[derive(Parser, Debug)]
#[command(name = "rsimacd", about = "RSI/MACD signal backtester")]
pub struct Cli {
    /// Debug-level diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan all series and write the capital-model reports
    Analyze {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        initial_capital: Option<f64>,
        #[arg(long)]
        parallel: bool,
    },
    /// Write the single-contract trade list
    Trades {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Output file names, relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFiles {
    pub fixed: String,
    pub reinvest: String,
    pub nondup: String,
    pub quarterly: String,
    pub trades: String,
}

impl Default for ReportFiles {
    fn default() -> Self {
        Self {
            fixed: "trades_report_fixed.csv".into(),
            reinvest: "trades_report_reinvest.csv".into(),
            nondup: "trades_report_fixed_nondup.csv".into(),
            quarterly: "quarterly_fixed.csv".into(),
            trades: "trade_report.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub backtest: BacktestConfig,
    pub files: ReportFiles,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from("."),
            backtest: BacktestConfig::default(),
            files: ReportFiles::default(),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze {
            config,
            input_dir,
            output_dir,
            initial_capital,
            parallel,
        } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                initial_capital,
                parallel,
            };
            run_analyze(config.as_deref(), overrides)
        }
        Command::Trades {
            config,
            input_dir,
            output_dir,
        } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                ..Overrides::default()
            };
            run_trades(config.as_deref(), overrides)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

/// Installs the stderr diagnostics subscriber. `RUST_LOG` applies unless
/// `verbose` forces debug.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, BacktestError> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| BacktestError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Validates `config` and resolves every setting, falling back to defaults.
pub fn build_run_settings(config: &dyn ConfigPort) -> Result<RunSettings, BacktestError> {
    validate_config(config)?;

    let defaults = ReportFiles::default();
    let file = |key: &str, default: &str| config.get_string_or("report", key, default);

    Ok(RunSettings {
        input_dir: PathBuf::from(config.get_string_or("data", "input_dir", DEFAULT_INPUT_DIR)),
        output_dir: PathBuf::from(config.get_string_or("report", "output_dir", ".")),
        backtest: BacktestConfig {
            exit_policy: ExitPolicy {
                tick_threshold: config.get_int(
                    "exit",
                    "tick_threshold",
                    DEFAULT_TICK_THRESHOLD as i64,
                ) as usize,
                max_wait: config.get_int("exit", "max_wait", DEFAULT_MAX_WAIT as i64) as usize,
            },
            capital: CapitalConfig {
                initial_capital: config.get_double(
                    "capital",
                    "initial_capital",
                    DEFAULT_INITIAL_CAPITAL,
                ),
                collateral_ratio: config.get_double(
                    "capital",
                    "collateral_ratio",
                    DEFAULT_COLLATERAL_RATIO,
                ),
            },
            parallel: config.get_bool("run", "parallel", false),
        },
        files: ReportFiles {
            fixed: file("fixed_file", &defaults.fixed),
            reinvest: file("reinvest_file", &defaults.reinvest),
            nondup: file("nondup_file", &defaults.nondup),
            quarterly: file("quarterly_file", &defaults.quarterly),
            trades: file("trades_file", &defaults.trades),
        },
    })
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub initial_capital: Option<f64>,
    pub parallel: bool,
}

impl Overrides {
    pub fn apply(self, settings: &mut RunSettings) -> Result<(), BacktestError> {
        if let Some(dir) = self.input_dir {
            settings.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
        if let Some(capital) = self.initial_capital {
            if capital <= 0.0 || !capital.is_finite() {
                return Err(BacktestError::ConfigInvalid {
                    section: "capital".into(),
                    key: "initial_capital".into(),
                    reason: "initial_capital must be positive".into(),
                });
            }
            settings.backtest.capital.initial_capital = capital;
        }
        settings.backtest.parallel |= self.parallel;
        Ok(())
    }
}

fn resolve_settings(
    config_path: Option<&Path>,
    overrides: Overrides,
) -> Result<RunSettings, BacktestError> {
    let adapter = load_config(config_path)?;
    let mut settings = build_run_settings(&adapter)?;
    overrides.apply(&mut settings)?;
    Ok(settings)
}

fn load_nonempty(
    data_port: &dyn DataPort,
    settings: &RunSettings,
) -> Result<UniverseLoad, BacktestError> {
    let load = load_universe(data_port)?;
    tracing::info!(
        loaded = load.loaded_count(),
        skipped = load.skipped.len(),
        "loaded series"
    );
    if load.series.is_empty() {
        return Err(BacktestError::NoData {
            dir: settings.input_dir.display().to_string(),
        });
    }
    Ok(load)
}

/// Full pipeline: load, backtest, write the three trade reports and the
/// quarterly summary. Nothing is written when no trades were found.
pub fn run_analysis(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
) -> Result<BacktestResult, BacktestError> {
    let load = load_nonempty(data_port, settings)?;
    let result = run_backtest(&load.series, &settings.backtest)?;

    let files = &settings.files;
    report_port.write_model_report(&files.fixed, &result.fixed)?;
    report_port.write_model_report(&files.reinvest, &result.reinvest)?;
    report_port.write_model_report(&files.nondup, &result.deduplicated)?;
    report_port.write_quarterly(&files.quarterly, &result.fixed.report.quarterly)?;

    Ok(result)
}

/// Single-contract trade list, without capital accounting.
pub fn run_trade_listing(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
) -> Result<TradeLedger, BacktestError> {
    let load = load_nonempty(data_port, settings)?;
    let ledger = collect_trades(
        &load.series,
        &settings.backtest.exit_policy,
        settings.backtest.parallel,
    );
    if ledger.is_empty() {
        return Err(BacktestError::NoTrades {
            series: load.series.len(),
        });
    }
    report_port.write_trade_list(&settings.files.trades, ledger.trades())?;
    Ok(ledger)
}

fn run_analyze(config_path: Option<&Path>, overrides: Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(e) => return report_failure(&e),
    };

    let data_port = CsvAdapter::new(settings.input_dir.clone());
    let report_port = CsvReportAdapter::new(settings.output_dir.clone());

    match run_analysis(&data_port, &report_port, &settings) {
        Ok(result) => {
            print!(
                "{}",
                console_summary::render(
                    "Fixed capital, one trade per entry date",
                    &result.deduplicated.report
                )
            );
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}

fn run_trades(config_path: Option<&Path>, overrides: Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(e) => return report_failure(&e),
    };

    let data_port = CsvAdapter::new(settings.input_dir.clone());
    let report_port = CsvReportAdapter::new(settings.output_dir.clone());

    match run_trade_listing(&data_port, &report_port, &settings) {
        Ok(ledger) => {
            println!("{} trades", ledger.len());
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let settings = match resolve_settings(Some(config_path), Overrides::default()) {
        Ok(s) => s,
        Err(e) => return report_failure(&e),
    };

    let bt = &settings.backtest;
    println!("input_dir:        {}", settings.input_dir.display());
    println!("output_dir:       {}", settings.output_dir.display());
    println!("tick_threshold:   {}", bt.exit_policy.tick_threshold);
    println!("max_wait:         {}", bt.exit_policy.max_wait);
    println!("initial_capital:  {:.2}", bt.capital.initial_capital);
    println!("collateral_ratio: {}", bt.capital.collateral_ratio);
    println!("parallel:         {}", bt.parallel);
    println!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn report_failure(err: &BacktestError) -> ExitCode {
    match err {
        BacktestError::NoTrades { .. } => tracing::warn!("{err}; no reports written"),
        _ => tracing::error!("{err}"),
    }
    ExitCode::from(err)
}
