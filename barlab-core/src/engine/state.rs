//! Run result bundle and engine errors.

use crate::config::ConfigError;
use crate::data::BarSeries;
use crate::domain::{EquitySnapshot, Order, OrderId, OrderStateError, OrderStatus, Trade};
use crate::strategy::StrategyError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("strategy '{strategy}' failed in init: {source}")]
    StrategyInit {
        strategy: String,
        #[source]
        source: StrategyError,
    },

    #[error("strategy '{strategy}' failed at bar {bar_index} ({timestamp}): {source}")]
    Strategy {
        strategy: String,
        bar_index: usize,
        timestamp: NaiveDateTime,
        #[source]
        source: StrategyError,
    },

    #[error("broker returned a fill for unknown order {0}")]
    UnknownOrder(OrderId),

    #[error(transparent)]
    OrderState(#[from] OrderStateError),
}

/// Everything a run produced, handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub symbol: String,
    pub strategy_name: String,
    pub initial_capital: f64,
    pub bars: BarSeries,
    pub equity_curve: Vec<EquitySnapshot>,
    pub trades: Vec<Trade>,
    pub orders: Vec<Order>,
}

impl RunResult {
    /// Total equity per bar.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|s| s.total_equity).collect()
    }

    /// Last snapshot's equity, or initial capital for an empty run.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|s| s.total_equity)
            .unwrap_or(self.initial_capital)
    }

    pub fn final_cash(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|s| s.cash)
            .unwrap_or(self.initial_capital)
    }

    pub fn total_commission(&self) -> f64 {
        self.trades.iter().map(|t| t.commission).sum()
    }

    pub fn total_slippage(&self) -> f64 {
        self.trades.iter().map(|t| t.slippage).sum()
    }

    pub fn rejected_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.status == OrderStatus::Rejected)
    }
}
