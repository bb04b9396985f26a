//! Backtest runner: wires together data, strategy factory, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads data as the config says, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars. Used by sweeps.

use barlab_core::config::EngineConfig;
use barlab_core::data::BarSeries;
use barlab_core::domain::{EquitySnapshot, Order, Trade};
use barlab_core::engine::{run_backtest, EngineError};
use barlab_core::fingerprint::RunFingerprint;
use barlab_core::strategy::StrategyError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, RunConfig, StrategySpec};
use crate::data_loader::{load, DataSource, LoadError, LoadedData};
use crate::factory::build_strategy;
use crate::metrics::PerformanceMetrics;
use crate::round_trip::{round_trips, RoundTrip};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: StrategySpec,
    pub strategy_name: String,
    pub start: String,
    pub end: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub final_cash: f64,
    pub bar_count: usize,
    pub has_synthetic: bool,
    pub metrics: PerformanceMetrics,
    pub fingerprint: RunFingerprint,
    pub equity_curve: Vec<EquitySnapshot>,
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub rejected_orders: Vec<Order>,
}

/// Default schema version for older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|s| s.total_equity).collect()
    }
}

/// Run a single backtest described by a `RunConfig`.
pub fn run_single_backtest(config: &RunConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let source = DataSource::from_config(config).ok_or(ConfigError::MissingData)?;
    let loaded = load(&source, &config.backtest.symbol)?;
    run_backtest_from_data(&loaded, &config.strategy, &config.engine_config())
}

/// Run a backtest on pre-loaded bars. No I/O.
pub fn run_backtest_from_data(
    data: &LoadedData,
    spec: &StrategySpec,
    engine_config: &EngineConfig,
) -> Result<BacktestResult, RunError> {
    let mut strategy = build_strategy(spec)?;
    let result = run_backtest(&data.bars, strategy.as_mut(), engine_config)?;

    let round_trips = round_trips(&result.trades, &result.bars);
    let metrics =
        PerformanceMetrics::compute(&result.equity_values(), &round_trips, &result.trades);
    let fingerprint = RunFingerprint::of(&result);

    info!(
        strategy = %result.strategy_name,
        total_return = metrics.total_return,
        round_trips = round_trips.len(),
        "run complete"
    );

    let (start, end) = date_range(&result.bars);
    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: result.symbol.clone(),
        strategy: spec.clone(),
        strategy_name: result.strategy_name.clone(),
        start,
        end,
        initial_capital: result.initial_capital,
        final_equity: result.final_equity(),
        final_cash: result.final_cash(),
        bar_count: result.bars.len(),
        has_synthetic: data.has_synthetic,
        metrics,
        fingerprint,
        rejected_orders: result.rejected_orders().cloned().collect(),
        equity_curve: result.equity_curve,
        trades: result.trades,
        round_trips,
    })
}

fn date_range(bars: &BarSeries) -> (String, String) {
    let fmt = |ts: Option<chrono::NaiveDateTime>| {
        ts.map(|t| t.date().to_string()).unwrap_or_default()
    };
    (fmt(bars.first_timestamp()), fmt(bars.last_timestamp()))
}
