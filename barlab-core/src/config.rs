//! Construction-time configuration for a single run.
//!
//! One `EngineConfig` carries everything the core reads at construction: capital,
//! symbol, the `CostModel` handed to the portfolio, and the default sizing knobs
//! the engine uses when a signal leaves its quantity open.

use crate::execution::CostModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_CASH_FRACTION: f64 = 0.95;
pub const DEFAULT_SYMBOL: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("{field} must be a non-negative finite number, got {value}")]
    NegativeRate { field: &'static str, value: f64 },

    #[error("slippage must be below 1.0, got {0}")]
    SlippageTooLarge(f64),

    #[error("lot size must be at least 1")]
    ZeroLotSize,

    #[error("cash fraction must be in (0, 1], got {0}")]
    InvalidCashFraction(f64),

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Market fee/lot presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Floor-and-tax fees, 100-share lots.
    AShare,
    /// Proportional fees, single-share granularity.
    Us,
}

impl Market {
    pub fn cost_model(&self) -> CostModel {
        match self {
            Market::AShare => CostModel::floor_and_tax(),
            Market::Us => CostModel::proportional(),
        }
    }

    pub fn lot_size(&self) -> u64 {
        match self {
            Market::AShare => 100,
            Market::Us => 1,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::AShare => write!(f, "a_share"),
            Market::Us => write!(f, "us"),
        }
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "a_share" | "ashare" | "cn" => Ok(Market::AShare),
            "us" | "usa" => Ok(Market::Us),
            other => Err(format!("unknown market '{other}' (expected a_share or us)")),
        }
    }
}

/// Configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub symbol: String,
    pub costs: CostModel,
    /// Default buy quantities are floored to a multiple of this.
    pub lot_size: u64,
    /// Share of cash a default-sized buy may spend.
    pub cash_fraction: f64,
}

impl EngineConfig {
    pub fn for_market(market: Market) -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            symbol: DEFAULT_SYMBOL.to_string(),
            costs: market.cost_model(),
            lot_size: market.lot_size(),
            cash_fraction: DEFAULT_CASH_FRACTION,
        }
    }

    pub fn with_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_lot_size(mut self, lot_size: u64) -> Self {
        self.lot_size = lot_size;
        self
    }

    pub fn with_cash_fraction(mut self, cash_fraction: f64) -> Self {
        self.cash_fraction = cash_fraction;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.lot_size == 0 {
            return Err(ConfigError::ZeroLotSize);
        }
        if !(self.cash_fraction > 0.0 && self.cash_fraction <= 1.0) {
            return Err(ConfigError::InvalidCashFraction(self.cash_fraction));
        }
        self.costs.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_market(Market::AShare)
    }
}
