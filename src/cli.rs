//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::MeanrevError;
use crate::domain::indicator::bundle::IndicatorParams;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::StrategyParams;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "meanrev", about = "Mean-reversion strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the strategy over a CSV bar feed
    Backtest {
        csv_file: PathBuf,
        /// Bar timeframe used to annualize returns (overrides the config)
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Replay the CSV rows last to first
        #[arg(long)]
        reverse: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and time range of a CSV feed
    Info {
        csv_file: PathBuf,
        #[arg(long)]
        reverse: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            csv_file,
            timeframe,
            config,
            reverse,
        } => run_backtest(&csv_file, timeframe, config.as_deref(), reverse),
        Command::Validate { config } => run_validate(&config),
        Command::Info { csv_file, reverse } => run_info(&csv_file, reverse),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MeanrevError> {
    let config = FileConfigAdapter::from_file(path)?;
    info!(config = %config.origin(), "loaded config");
    Ok(config)
}

fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, MeanrevError> {
    path.map_or_else(|| Ok(FileConfigAdapter::empty()), load_config)
}

/// Strategy parameters with unset periods derived from `period`.
///
/// Expects a config that already passed [`validate_strategy_config`].
pub fn build_strategy_params(config: &dyn ConfigPort) -> StrategyParams {
    let defaults = StrategyParams::default();
    let period = positive(config.get_int("strategy", "period", defaults.period as i64));
    let derived = IndicatorParams::from_period(period, defaults.devfactor);

    StrategyParams {
        period,
        devfactor: config.get_double("strategy", "devfactor", defaults.devfactor),
        adf_threshold: config.get_double("strategy", "adf_threshold", defaults.adf_threshold),
        percent_stake: config.get_double("strategy", "percent_stake", defaults.percent_stake),
        dupe_period: positive(config.get_int(
            "strategy",
            "dupe_period",
            derived.dupe_period as i64,
        )),
        fast_period: positive(config.get_int(
            "strategy",
            "fast_period",
            derived.fast_period as i64,
        )),
        signal_period: positive(config.get_int(
            "strategy",
            "signal_period",
            derived.signal_period as i64,
        )),
    }
}

fn positive(value: i64) -> usize {
    value.max(1) as usize
}

/// Backtest settings; a `timeframe` given on the command line wins over the config.
pub fn build_backtest_config(
    config: &dyn ConfigPort,
    timeframe: Option<Timeframe>,
) -> Result<BacktestConfig, MeanrevError> {
    let defaults = BacktestConfig::default();
    let timeframe = match timeframe {
        Some(tf) => tf,
        None => match config.get_string("backtest", "timeframe") {
            Some(raw) => raw.parse().map_err(|reason| MeanrevError::ConfigInvalid {
                section: "backtest".into(),
                key: "timeframe".into(),
                reason,
            })?,
            None => defaults.timeframe,
        },
    };

    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", defaults.initial_capital),
        commission_pct: config.get_double("backtest", "commission_pct", defaults.commission_pct),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
        timeframe,
    })
}

fn run_backtest(
    csv_file: &Path,
    timeframe: Option<Timeframe>,
    config_path: Option<&Path>,
    reverse: bool,
) -> Result<(), MeanrevError> {
    let config = load_optional_config(config_path)?;
    validate_strategy_config(&config)?;
    validate_backtest_config(&config)?;

    let params = build_strategy_params(&config);
    let bt_config = build_backtest_config(&config, timeframe)?;
    let reverse = reverse || config.get_bool("backtest", "reverse", false);

    info!(path = %csv_file.display(), reverse, "loading bars");
    let data_port = CsvAdapter::new(csv_file.to_path_buf(), reverse);
    let (result, metrics) = run_backtest_pipeline(&data_port, &params, &bt_config)?;

    print!("{}", Report::new(&result, &metrics, &bt_config));
    Ok(())
}

/// Loads bars from `data_port`, runs the strategy and computes analytics.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<(BacktestResult, Metrics), MeanrevError> {
    let bars = data_port.fetch_ohlcv()?;
    info!(
        bars = bars.len(),
        period = params.period,
        timeframe = %config.timeframe,
        "running backtest"
    );
    let result = backtest_engine::run_backtest(&bars, params, config)?;
    let metrics = Metrics::compute(&result.portfolio, config.risk_free_rate, config.timeframe);
    Ok((result, metrics))
}

/// Plain-text summary of a finished run, rendered through `Display`.
pub struct Report<'a> {
    result: &'a BacktestResult,
    metrics: &'a Metrics,
    config: &'a BacktestConfig,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a BacktestResult, metrics: &'a Metrics, config: &'a BacktestConfig) -> Self {
        Self {
            result,
            metrics,
            config,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            result,
            metrics,
            config,
        } = self;
        let portfolio = &result.portfolio;

        writeln!(f, "=== Returns ===")?;
        writeln!(f, "Total Return (log):   {:.6}", metrics.total_return)?;
        writeln!(f, "Average Return:       {:.8}", metrics.average_return)?;
        writeln!(
            f,
            "Annualized Return:    {:.2}% ({})",
            metrics.annualized_return * 100.0,
            config.timeframe
        )?;
        writeln!(f, "Initial Capital:      {:.2}", portfolio.initial_capital)?;
        writeln!(f, "Final Equity:         {:.2}", portfolio.final_equity())?;

        writeln!(f, "\n=== Drawdown ===")?;
        writeln!(f, "Max Drawdown:         -{:.2}%", metrics.max_drawdown_pct * 100.0)?;
        writeln!(f, "Max Money Down:       {:.2}", metrics.max_drawdown_money)?;
        writeln!(f, "Max Drawdown Length:  {} bars", metrics.max_drawdown_len)?;

        writeln!(f, "\n=== Sharpe Ratio ===")?;
        match metrics.sharpe_ratio {
            Some(sharpe) => writeln!(f, "Sharpe Ratio:         {:.4}", sharpe)?,
            None => writeln!(f, "Sharpe Ratio:         n/a")?,
        }

        writeln!(f, "\n=== Trades ===")?;
        writeln!(f, "Round Trips:          {}", metrics.total_trades)?;
        writeln!(
            f,
            "Won / Lost / Even:    {} / {} / {}",
            metrics.trades_won, metrics.trades_lost, metrics.trades_breakeven
        )?;
        writeln!(f, "Win Rate:             {:.1}%", metrics.win_rate * 100.0)?;
        writeln!(f, "Profit Factor:        {:.2}", metrics.profit_factor)?;
        writeln!(
            f,
            "Orders:               {} placed, {} canceled, {} rejected",
            result.orders_placed, result.orders_canceled, result.stats.rejected_orders
        )?;
        if let Some(position) = &portfolio.position {
            writeln!(
                f,
                "Open Position:        {:.6} @ {:.2}",
                position.size, position.entry_price
            )?;
        }
        if result.statistic_failures > 0 {
            writeln!(
                f,
                "Statistic Failures:   {} blocks undefined",
                result.statistic_failures
            )?;
        }
        Ok(())
    }
}

fn run_validate(config_path: &Path) -> Result<(), MeanrevError> {
    let config = load_config(config_path)?;
    validate_strategy_config(&config)?;
    validate_backtest_config(&config)?;

    let params = build_strategy_params(&config);
    let bt_config = build_backtest_config(&config, None)?;

    println!("[strategy]");
    println!("period = {}", params.period);
    println!("devfactor = {}", params.devfactor);
    println!("adf_threshold = {}", params.adf_threshold);
    println!("percent_stake = {}", params.percent_stake);
    println!("dupe_period = {}", params.dupe_period);
    println!("fast_period = {}", params.fast_period);
    println!("signal_period = {}", params.signal_period);
    println!();
    println!("[backtest]");
    println!("initial_capital = {}", bt_config.initial_capital);
    println!("commission_pct = {}", bt_config.commission_pct);
    println!("risk_free_rate = {}", bt_config.risk_free_rate);
    println!("timeframe = {}", bt_config.timeframe);
    println!("reverse = {}", config.get_bool("backtest", "reverse", false));
    eprintln!("\n{} is valid.", config.origin());
    Ok(())
}

fn run_info(csv_file: &Path, reverse: bool) -> Result<(), MeanrevError> {
    let adapter = CsvAdapter::new(csv_file.to_path_buf(), reverse);
    match adapter.get_data_range()? {
        Some((first, last, count)) => {
            println!("{}: {} bars, {} to {}", csv_file.display(), count, first, last);
            if first >= last && count > 1 {
                eprintln!("warning: feed runs backwards, try --reverse");
            }
        }
        None => eprintln!("{}: no data found", csv_file.display()),
    }
    Ok(())
}
