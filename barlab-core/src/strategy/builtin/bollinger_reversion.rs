//! Bollinger band reversion: buy at or under the lower band while flat, sell at or
//! over the upper band while holding.

use super::value_at;
use crate::data::BarSeries;
use crate::domain::Bar;
use crate::indicators::{Bollinger, Indicator};
use crate::strategy::{Strategy, StrategyContext, StrategyError};

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    period: usize,
    width: f64,
    name: String,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl BollingerReversion {
    pub fn new(period: usize, width: f64) -> Result<Self, StrategyError> {
        if period < 2 {
            return Err(StrategyError::new("bollinger period must be >= 2"));
        }
        if !(width.is_finite() && width > 0.0) {
            return Err(StrategyError::new(format!("bollinger width must be positive, got {width}")));
        }
        Ok(Self {
            period,
            width,
            name: format!("bollinger({period}, {width})"),
            upper: Vec::new(),
            lower: Vec::new(),
        })
    }
}

impl Default for BollingerReversion {
    fn default() -> Self {
        Self {
            period: 20,
            width: 2.0,
            name: "bollinger(20, 2)".to_string(),
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, bars: &BarSeries) -> Result<(), StrategyError> {
        self.upper = Bollinger::upper(self.period, self.width).compute(bars.bars());
        self.lower = Bollinger::lower(self.period, self.width).compute(bars.bars());
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>, bar: &Bar) -> Result<(), StrategyError> {
        let i = ctx.index();
        if i < self.period {
            return Ok(());
        }
        let upper = value_at(&self.upper, i, "upper band")?;
        let lower = value_at(&self.lower, i, "lower band")?;
        if bar.close <= lower && ctx.position() == 0 {
            ctx.buy(0);
        } else if bar.close >= upper && ctx.position() > 0 {
            ctx.sell(0);
        }
        Ok(())
    }
}
