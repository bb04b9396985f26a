//! Built-in strategies. Each precomputes its indicators in `init`, trades with
//! engine-sized market orders, and only ever holds one position at a time.

pub mod bollinger_reversion;
pub mod rsi_reversion;
pub mod sma_cross;

pub use bollinger_reversion::BollingerReversion;
pub use rsi_reversion::RsiReversion;
pub use sma_cross::SmaCross;

use super::StrategyError;

/// Value of a precomputed series at `index`, or an error if `init` never ran.
pub(crate) fn value_at(series: &[f64], index: usize, name: &str) -> Result<f64, StrategyError> {
    series
        .get(index)
        .copied()
        .ok_or_else(|| StrategyError::new(format!("{name}: no value at bar {index}; was init called?")))
}
