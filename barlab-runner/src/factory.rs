//! Strategy factory: `StrategySpec` → boxed `Strategy`.

use barlab_core::strategy::{BollingerReversion, RsiReversion, SmaCross, Strategy, StrategyError};

use crate::config::StrategySpec;

/// Build a fresh strategy instance, validating its parameters.
pub fn build_strategy(spec: &StrategySpec) -> Result<Box<dyn Strategy>, StrategyError> {
    Ok(match *spec {
        StrategySpec::SmaCross { short, long } => Box::new(SmaCross::new(short, long)?),
        StrategySpec::Rsi {
            period,
            oversold,
            overbought,
        } => Box::new(RsiReversion::new(period, oversold, overbought)?),
        StrategySpec::Bollinger { period, width } => Box::new(BollingerReversion::new(period, width)?),
    })
}
