//! Portfolio: the cash/position ledger for one run.
//!
//! The ledger is the only writer of cash and position: both change solely through
//! `execute_fill`, which validates the whole fill before touching any field, so a
//! rejected fill leaves the ledger exactly as it was.
//!
//! Invariants held after every call:
//! - `cash >= 0` and `position >= 0` (no short selling, no margin)
//! - `position == 0` if and only if `avg_cost == 0`
//!
//! Equity snapshots are full precision: `cash`, `market_value` and `total_equity`
//! are not rounded to cents. Only fill prices and fees are rounded, by the cost model.

use super::rejection::Rejection;
use super::snapshot::EquitySnapshot;
use super::trade::Trade;
use super::OrderSide;
use crate::config::{ConfigError, EngineConfig};
use crate::event::FillEvent;
use crate::execution::CostModel;
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_capital: f64,
    cash: f64,
    position: u64,
    avg_cost: f64,
    costs: CostModel,
    total_commission: f64,
    total_slippage: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySnapshot>,
}

impl Portfolio {
    pub fn new(initial_capital: f64, costs: CostModel) -> Result<Self, ConfigError> {
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(ConfigError::NonPositiveCapital(initial_capital));
        }
        costs.validate()?;
        Ok(Self {
            initial_capital,
            cash: initial_capital,
            position: 0,
            avg_cost: 0.0,
            costs,
            total_commission: 0.0,
            total_slippage: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config.initial_capital, config.costs.clone())
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn avg_cost(&self) -> f64 {
        self.avg_cost
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn total_slippage(&self) -> f64 {
        self.total_slippage
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquitySnapshot] {
        &self.equity_curve
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0
    }

    /// Base price moved against the trader by the configured slippage.
    pub fn slipped_price(&self, base_price: f64, side: OrderSide) -> f64 {
        self.costs.slipped_price(base_price, side)
    }

    pub fn commission(&self, price: f64, quantity: u64, side: OrderSide) -> f64 {
        self.costs.commission(price, quantity, side)
    }

    /// Check a prospective fill against current cash and position.
    ///
    /// Shared by the broker (before it emits a fill) and by `execute_fill`
    /// (when the fill is applied).
    pub fn check_fill(
        &self,
        side: OrderSide,
        price: f64,
        quantity: u64,
        commission: f64,
    ) -> Result<(), Rejection> {
        if quantity == 0 {
            return Err(Rejection::ZeroQuantity);
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(Rejection::InvalidPrice(price));
        }
        let amount = price * quantity as f64;
        match side {
            OrderSide::Buy => {
                let required = amount + commission;
                if required > self.cash {
                    return Err(Rejection::InsufficientCash {
                        required,
                        available: self.cash,
                    });
                }
            }
            OrderSide::Sell => {
                if quantity > self.position {
                    return Err(Rejection::InsufficientPosition {
                        requested: quantity,
                        held: self.position,
                    });
                }
                // A commission floor above the proceeds must still be payable.
                if self.cash + (amount - commission) < 0.0 {
                    return Err(Rejection::InsufficientCash {
                        required: commission - amount,
                        available: self.cash,
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply a fill to the ledger and append it to the trade history.
    pub fn execute_fill(&mut self, fill: &FillEvent) -> Result<&Trade, Rejection> {
        self.check_fill(fill.side, fill.fill_price, fill.quantity, fill.commission)?;

        let amount = fill.fill_price * fill.quantity as f64;
        match fill.side {
            OrderSide::Buy => {
                let new_position = self.position + fill.quantity;
                self.avg_cost =
                    (self.avg_cost * self.position as f64 + amount) / new_position as f64;
                self.position = new_position;
                self.cash -= amount + fill.commission;
            }
            OrderSide::Sell => {
                self.position -= fill.quantity;
                self.cash += amount - fill.commission;
                if self.position == 0 {
                    self.avg_cost = 0.0;
                }
            }
        }
        self.total_commission += fill.commission;
        self.total_slippage += fill.slippage_cost;

        self.trades.push(Trade {
            order_id: fill.order_id,
            timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            side: fill.side,
            price: fill.fill_price,
            quantity: fill.quantity,
            commission: fill.commission,
            slippage: fill.slippage_cost,
        });
        // Just pushed.
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn market_value(&self, close: f64) -> f64 {
        self.position as f64 * close
    }

    pub fn total_equity(&self, close: f64) -> f64 {
        self.cash + self.market_value(close)
    }

    /// Equity row for `close`. Reads only.
    pub fn snapshot(&self, timestamp: NaiveDateTime, close: f64) -> EquitySnapshot {
        let market_value = self.market_value(close);
        EquitySnapshot {
            timestamp,
            cash: self.cash,
            market_value,
            total_equity: self.cash + market_value,
            position: self.position,
        }
    }

    /// Append a snapshot to the equity curve.
    pub fn record_snapshot(&mut self, timestamp: NaiveDateTime, close: f64) -> &EquitySnapshot {
        let snapshot = self.snapshot(timestamp, close);
        self.equity_curve.push(snapshot);
        &self.equity_curve[self.equity_curve.len() - 1]
    }
}
