//! Moving-average crossover.
//!
//! Golden cross (short SMA moves from at-or-below to above the long SMA) while
//! flat → buy. Death cross while holding → sell everything.

use super::value_at;
use crate::data::BarSeries;
use crate::domain::Bar;
use crate::indicators::{Indicator, Sma};
use crate::strategy::{Strategy, StrategyContext, StrategyError};

#[derive(Debug, Clone)]
pub struct SmaCross {
    short: usize,
    long: usize,
    name: String,
    short_ma: Vec<f64>,
    long_ma: Vec<f64>,
}

impl SmaCross {
    pub fn new(short: usize, long: usize) -> Result<Self, StrategyError> {
        if short == 0 || short >= long {
            return Err(StrategyError::new(format!(
                "sma_cross needs 0 < short < long, got short={short} long={long}"
            )));
        }
        Ok(Self {
            short,
            long,
            name: format!("sma_cross({short}/{long})"),
            short_ma: Vec::new(),
            long_ma: Vec::new(),
        })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl Default for SmaCross {
    fn default() -> Self {
        Self {
            short: 5,
            long: 20,
            name: "sma_cross(5/20)".to_string(),
            short_ma: Vec::new(),
            long_ma: Vec::new(),
        }
    }
}

impl Strategy for SmaCross {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, bars: &BarSeries) -> Result<(), StrategyError> {
        self.short_ma = Sma::new(self.short).compute(bars.bars());
        self.long_ma = Sma::new(self.long).compute(bars.bars());
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>, _bar: &Bar) -> Result<(), StrategyError> {
        let i = ctx.index();
        if i < self.long {
            return Ok(());
        }
        let short_now = value_at(&self.short_ma, i, "short sma")?;
        let long_now = value_at(&self.long_ma, i, "long sma")?;
        let short_prev = value_at(&self.short_ma, i - 1, "short sma")?;
        let long_prev = value_at(&self.long_ma, i - 1, "long sma")?;

        if short_prev <= long_prev && short_now > long_now {
            if ctx.position() == 0 {
                ctx.buy(0);
            }
        } else if short_prev >= long_prev && short_now < long_now && ctx.position() > 0 {
            ctx.sell(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Market};
    use crate::domain::OrderSide;
    use crate::engine::run_backtest;
    use crate::execution::CostModel;
    use crate::indicators::series_from_closes;

    fn config() -> EngineConfig {
        EngineConfig::for_market(Market::Us)
            .with_costs(CostModel::frictionless())
            .with_capital(10_000.0)
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(SmaCross::new(0, 5).is_err());
        assert!(SmaCross::new(5, 5).is_err());
        assert!(SmaCross::new(2, 4).is_ok());
    }

    #[test]
    fn buys_golden_cross_and_sells_death_cross() {
        // Down, then up (golden cross), then down (death cross).
        let closes = [
            10.0, 9.0, 8.0, 7.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0,
        ];
        let bars = series_from_closes(&closes);
        let mut strategy = SmaCross::new(2, 4).unwrap();
        let result = run_backtest(&bars, &mut strategy, &config()).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].side, OrderSide::Buy);
        assert_eq!(result.trades[1].side, OrderSide::Sell);
        assert_eq!(result.equity_curve.last().unwrap().position, 0);
    }

    #[test]
    fn flat_prices_never_trade() {
        let bars = series_from_closes(&[10.0; 30]);
        let result = run_backtest(&bars, &mut SmaCross::default(), &config()).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.strategy_name, "sma_cross(5/20)");
    }

    #[test]
    fn on_bar_without_init_is_an_error() {
        use crate::domain::Portfolio;
        let bars = series_from_closes(&[10.0; 25]);
        let portfolio = Portfolio::new(1_000.0, CostModel::frictionless()).unwrap();
        let mut ctx = StrategyContext::new(&bars, 21, &portfolio, "X");
        let mut strategy = SmaCross::default();
        let bar = bars.bars()[21].clone();
        assert!(strategy.on_bar(&mut ctx, &bar).is_err());
    }
}
