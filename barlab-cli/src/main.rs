//! BarLab command line.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config, or from flags
//! - `sweep`: grid-search SMA crossover windows in parallel and print the top N
//! - `validate`: load a bar file and report its shape or the first problem found
//! - `synth`: write deterministic synthetic bars to CSV or Parquet

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use barlab_core::config::Market;
use barlab_core::data::{load_bars, write_bars, BarSeries};
use barlab_runner::config::{
    BacktestSection, CostOverrides, RunConfig, StrategySpec, SyntheticSpec,
};
use barlab_runner::data_loader::generate_synthetic_bars;
use barlab_runner::export::{export_json, save_artifacts};
use barlab_runner::sweep::{run_sweep, ParamGrid, RankingMetric};
use barlab_runner::{load, run_single_backtest, BacktestResult, DataSource};

#[derive(Parser)]
#[command(name = "barlab", about = "BarLab: event-driven bar backtester")]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Data and account flags shared by `run` and `sweep`.
#[derive(Args, Clone)]
struct DataArgs {
    /// CSV or Parquet bar file.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate this many synthetic bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// First synthetic date (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-02")]
    start: String,

    #[arg(long, default_value = "SYNTH")]
    symbol: String,

    /// a_share or us.
    #[arg(long, default_value = "a_share")]
    market: String,

    #[arg(long, default_value_t = 100_000.0)]
    capital: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file or from flags.
    Run {
        /// Path to a TOML config file. Other data/strategy flags are ignored.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        data: DataArgs,

        /// sma_cross, rsi, or bollinger (default parameters).
        #[arg(long, default_value = "sma_cross")]
        strategy: String,

        /// Write manifest/CSV/report artifacts under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Sweep SMA crossover windows in parallel.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Short windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![5, 10, 20])]
        short: Vec<usize>,

        /// Long windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![20, 30, 60])]
        long: Vec<usize>,

        /// total_return, sharpe, sortino, calmar, or max_drawdown.
        #[arg(long, default_value = "sharpe")]
        rank_by: String,

        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Load a bar file and report row count and date range.
    Validate {
        path: PathBuf,
    },
    /// Write synthetic bars to a CSV or Parquet file.
    Synth {
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        #[arg(long, default_value = "2020-01-02")]
        start: String,

        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// Output path (.csv or .parquet).
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            data,
            strategy,
            output_dir,
            json,
        } => run_backtest_cmd(config, data, &strategy, output_dir, json),
        Commands::Sweep {
            data,
            short,
            long,
            rank_by,
            top,
        } => run_sweep_cmd(data, short, long, &rank_by, top),
        Commands::Validate { path } => run_validate(&path),
        Commands::Synth {
            symbol,
            start,
            bars,
            out,
        } => run_synth(&symbol, &start, bars, &out),
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Build a `RunConfig` from flags, through the same validation as a TOML file.
fn config_from_args(args: &DataArgs, strategy: StrategySpec) -> Result<RunConfig> {
    let market: Market = args.market.parse().map_err(anyhow::Error::msg)?;
    let synthetic = match args.synthetic {
        Some(bars) => Some(SyntheticSpec {
            start: parse_date(&args.start)?,
            bars,
        }),
        None => None,
    };
    if args.data.is_none() && synthetic.is_none() {
        bail!("one of --data, --synthetic, or --config is required");
    }
    let config = RunConfig {
        backtest: BacktestSection {
            symbol: args.symbol.clone(),
            market,
            initial_capital: args.capital,
            data: args.data.clone(),
            synthetic,
            lot_size: None,
            cash_fraction: None,
        },
        costs: CostOverrides::default(),
        strategy,
    };
    config.validate()?;
    Ok(config)
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    data: DataArgs,
    strategy: &str,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => RunConfig::from_file(&path)?,
        None => {
            let Some(spec) = StrategySpec::from_kind(strategy) else {
                bail!("unknown strategy '{strategy}'. Valid: sma_cross, rsi, bollinger");
            };
            config_from_args(&data, spec)?
        }
    };

    let run_id = config.run_id();
    info!(run_id = %run_id, strategy = config.strategy.kind(), "running backtest");
    let result = run_single_backtest(&config)?;

    if json {
        println!("{}", export_json(&result)?);
    } else {
        print_summary(&result, &run_id);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    data: DataArgs,
    short: Vec<usize>,
    long: Vec<usize>,
    rank_by: &str,
    top: usize,
) -> Result<()> {
    let metric: RankingMetric = rank_by.parse().map_err(anyhow::Error::msg)?;
    let config = config_from_args(&data, StrategySpec::SmaCross { short: 5, long: 20 })?;
    let source = DataSource::from_config(&config).context("no data source")?;
    let loaded = load(&source, &config.backtest.symbol)?;

    let grid = ParamGrid::SmaCross {
        shorts: short,
        longs: long,
    };
    if grid.size() == 0 {
        bail!("grid is empty: every short window must be below some long window");
    }
    let results = run_sweep(&loaded, &grid, &config.engine_config())?;

    println!(
        "Sweep: {} runs on {} ({} bars), ranked by {metric}",
        results.len(),
        config.backtest.symbol,
        loaded.bars.len()
    );
    println!(
        "{:<4} {:<18} {:>10} {:>8} {:>8} {:>10} {:>6}",
        "#", "Strategy", "Return", "Sharpe", "Sortino", "MaxDD", "Trips"
    );
    println!("{}", "-".repeat(70));
    for (rank, r) in results.top_n(metric, top).iter().enumerate() {
        let m = &r.metrics;
        println!(
            "{:<4} {:<18} {:>9.2}% {:>8.3} {:>8.3} {:>9.2}% {:>6}",
            rank + 1,
            r.strategy_name,
            m.total_return * 100.0,
            m.sharpe,
            m.sortino,
            m.max_drawdown * 100.0,
            m.round_trip_count
        );
    }
    Ok(())
}

fn run_validate(path: &std::path::Path) -> Result<()> {
    match load_bars(path) {
        Ok(series) => {
            print_series_info(path, &series);
            Ok(())
        }
        Err(e) => bail!("{}: {e}", path.display()),
    }
}

fn print_series_info(path: &std::path::Path, series: &BarSeries) {
    println!("File:  {}", path.display());
    println!("Rows:  {}", series.len());
    match (series.first_timestamp(), series.last_timestamp()) {
        (Some(first), Some(last)) => println!("Range: {first} to {last}"),
        _ => println!("Range: (empty)"),
    }
}

fn run_synth(symbol: &str, start: &str, bars: usize, out: &std::path::Path) -> Result<()> {
    let series = BarSeries::new(generate_synthetic_bars(symbol, parse_date(start)?, bars))?;
    write_bars(&series, out)?;
    print_series_info(out, &series);
    Ok(())
}

fn print_summary(result: &BacktestResult, run_id: &str) {
    let m = &result.metrics;
    println!();
    println!("{}", "=".repeat(60));
    println!("  {}  |  {}", result.strategy_name, result.symbol);
    println!("  {} to {}  ({} bars)", result.start, result.end, result.bar_count);
    if result.has_synthetic {
        println!("  ** synthetic data **");
    }
    println!("{}", "=".repeat(60));
    println!("  {:<22} {:>14.2}", "Initial capital", result.initial_capital);
    println!("  {:<22} {:>14.2}", "Final equity", result.final_equity);
    println!("  {:<22} {:>13.2}%", "Total return", m.total_return * 100.0);
    println!("  {:<22} {:>13.2}%", "Annualized return", m.annualized_return * 100.0);
    println!("  {:<22} {:>13.2}%", "Max drawdown", m.max_drawdown * 100.0);
    println!("  {:<22} {:>10} bars", "Max DD duration", m.max_drawdown_bars);
    println!("  {:<22} {:>13.2}%", "Volatility", m.volatility * 100.0);
    println!("  {:<22} {:>14.3}", "Sharpe", m.sharpe);
    println!("  {:<22} {:>14.3}", "Sortino", m.sortino);
    println!("  {:<22} {:>14.3}", "Calmar", m.calmar);
    println!("  {:<22} {:>13.2}%", "Win rate", m.win_rate * 100.0);
    match m.profit_loss_ratio {
        Some(r) => println!("  {:<22} {:>14.2}", "Profit/loss ratio", r),
        None => println!("  {:<22} {:>14}", "Profit/loss ratio", "n/a"),
    }
    println!("  {:<22} {:>14}", "Round trips", m.round_trip_count);
    println!("  {:<22} {:>14}", "Fills", m.fill_count);
    println!("  {:<22} {:>14}", "Rejected orders", result.rejected_orders.len());
    println!("  {:<22} {:>14.2}", "Commission", m.total_commission);
    println!("  {:<22} {:>14.2}", "Slippage", m.total_slippage);
    println!("{}", "-".repeat(60));
    println!("  run id  {run_id}");
    println!("  digest  {}", result.fingerprint.result_digest);
    println!();
}
