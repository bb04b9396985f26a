//! Strategy contract.
//!
//! A strategy is called in three places:
//! - `init` once before the first bar, with the whole bar table (indicators are
//!   usually computed vectorized here);
//! - `on_bar` exactly once per bar in timestamp order, with a `StrategyContext`
//!   it uses to read state and emit buy/sell signals;
//! - `on_fill` after the ledger accepts a fill for one of its orders.
//!
//! Strategies never see the portfolio mutably. Any error returned from a hook
//! aborts the run.

pub mod builtin;
pub mod context;

pub use builtin::{BollingerReversion, RsiReversion, SmaCross};
pub use context::{OrderRequest, StrategyContext};

use crate::data::BarSeries;
use crate::domain::Bar;
use crate::event::FillEvent;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct StrategyError {
    message: String,
}

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait Strategy: Send {
    /// Display name used in results and logs.
    fn name(&self) -> &str;

    fn init(&mut self, _bars: &BarSeries) -> Result<(), StrategyError> {
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>, bar: &Bar) -> Result<(), StrategyError>;

    fn on_fill(&mut self, _fill: &FillEvent) -> Result<(), StrategyError> {
        Ok(())
    }
}
