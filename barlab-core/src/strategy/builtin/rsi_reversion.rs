//! RSI mean reversion: buy oversold while flat, sell overbought while holding.

use super::value_at;
use crate::data::BarSeries;
use crate::domain::Bar;
use crate::indicators::{Indicator, Rsi};
use crate::strategy::{Strategy, StrategyContext, StrategyError};

#[derive(Debug, Clone)]
pub struct RsiReversion {
    period: usize,
    oversold: f64,
    overbought: f64,
    name: String,
    rsi: Vec<f64>,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, StrategyError> {
        if period == 0 {
            return Err(StrategyError::new("rsi period must be >= 1"));
        }
        if !(0.0..=100.0).contains(&oversold)
            || !(0.0..=100.0).contains(&overbought)
            || oversold >= overbought
        {
            return Err(StrategyError::new(format!(
                "rsi thresholds need 0 <= oversold < overbought <= 100, got {oversold}/{overbought}"
            )));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
            name: format!("rsi({period}, {oversold}/{overbought})"),
            rsi: Vec::new(),
        })
    }
}

impl Default for RsiReversion {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            name: "rsi(14, 30/70)".to_string(),
            rsi: Vec::new(),
        }
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, bars: &BarSeries) -> Result<(), StrategyError> {
        self.rsi = Rsi::new(self.period).compute(bars.bars());
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>, _bar: &Bar) -> Result<(), StrategyError> {
        let i = ctx.index();
        if i < self.period {
            return Ok(());
        }
        let rsi = value_at(&self.rsi, i, "rsi")?;
        if rsi < self.oversold && ctx.position() == 0 {
            ctx.buy(0);
        } else if rsi > self.overbought && ctx.position() > 0 {
            ctx.sell(0);
        }
        Ok(())
    }
}
