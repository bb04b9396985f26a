//! BarLab Core: a single-symbol, bar-level, event-driven backtest engine.
//!
//! This crate contains:
//! - Domain types (bars, orders, trades, the portfolio ledger)
//! - The event queue and its four event kinds (market, signal, order, fill)
//! - A simulated broker with market and limit fills plus a cost model
//! - The strategy contract, a few indicators and built-in strategies
//! - Bar table ingest (CSV / Parquet via polars) and run fingerprints

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod event;
pub mod execution;
pub mod fingerprint;
pub mod indicators;
pub mod strategy;

pub use config::{ConfigError, EngineConfig, Market};
pub use data::{BarSeries, TableError};
pub use engine::{run_backtest, Engine, EngineError, RunResult};
pub use strategy::{Strategy, StrategyContext, StrategyError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross thread boundaries in parameter sweeps
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::EquitySnapshot>();
        require_sync::<domain::EquitySnapshot>();

        require_send::<domain::OrderId>();
        require_sync::<domain::OrderId>();
        require_send::<domain::DatasetHash>();
        require_sync::<domain::DatasetHash>();

        require_send::<event::Event>();
        require_sync::<event::Event>();
        require_send::<event::EventQueue>();
        require_send::<BarSeries>();
        require_sync::<BarSeries>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();
        require_send::<RunResult>();
        require_sync::<RunResult>();

        require_send::<strategy::SmaCross>();
        require_send::<strategy::RsiReversion>();
        require_send::<strategy::BollingerReversion>();
        require_send::<Box<dyn Strategy>>();
    }

    #[test]
    fn send_sync_check_compiles() {
        assert_send_sync();
    }
}
