//! BarLab Runner: run configuration, data loading, metrics, sweeps, export.
//!
//! This crate builds on `barlab-core` to provide:
//! - TOML run configs with a content-addressed run id
//! - Bar loading from CSV/Parquet, or deterministic synthetic bars
//! - A strategy factory over the built-in strategies
//! - FIFO round-trip extraction and performance metrics
//! - Parallel parameter sweeps (rayon)
//! - JSON/CSV/Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod factory;
pub mod metrics;
pub mod round_trip;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, RunConfig, RunId, StrategySpec, SyntheticSpec};
pub use data_loader::{load, DataSource, LoadError, LoadedData};
pub use factory::build_strategy;
pub use metrics::PerformanceMetrics;
pub use round_trip::{round_trips, RoundTrip};
pub use runner::{run_backtest_from_data, run_single_backtest, BacktestResult, RunError};
pub use sweep::{run_sweep, ParamGrid, RankingMetric, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<RoundTrip>();
        assert_sync::<RoundTrip>();
    }

    #[test]
    fn inputs_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }
}
