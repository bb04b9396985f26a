//! Orders: side, type, lifecycle status, and the order record kept per run.

use super::ids::OrderId;
use super::rejection::Rejection;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy or sell. Short selling is not modeled, so a sell can only reduce a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill at the bar's close.
    Market,
    /// Fill at the limit price or better, if the bar's range touched it.
    Limit { limit_price: f64 },
}

impl OrderType {
    pub fn limit_price(&self) -> Option<f64> {
        match self {
            OrderType::Market => None,
            OrderType::Limit { limit_price } => Some(*limit_price),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit { .. } => "LIMIT",
        }
    }
}

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order {order_id}: illegal transition {from:?} -> {to:?}")]
pub struct OrderStateError {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Record of one sized order and how it was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub timestamp: NaiveDateTime,
    pub bar_index: usize,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: u64,
    pub status: OrderStatus,
    pub filled_price: Option<f64>,
    pub filled_quantity: u64,
    pub commission: f64,
    pub rejection: Option<Rejection>,
}

impl Order {
    pub fn new(
        id: OrderId,
        timestamp: NaiveDateTime,
        bar_index: usize,
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        quantity: u64,
    ) -> Self {
        Self {
            id,
            timestamp,
            bar_index,
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            status: OrderStatus::Pending,
            filled_price: None,
            filled_quantity: 0,
            commission: 0.0,
            rejection: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Pending → Filled. The simulated broker never partially fills.
    pub fn fill(&mut self, price: f64, quantity: u64, commission: f64) -> Result<(), OrderStateError> {
        self.transition(OrderStatus::Filled)?;
        self.filled_price = Some(price);
        self.filled_quantity = quantity;
        self.commission = commission;
        Ok(())
    }

    /// Pending → Rejected, keeping the reason.
    pub fn reject(&mut self, reason: Rejection) -> Result<(), OrderStateError> {
        self.transition(OrderStatus::Rejected)?;
        self.rejection = Some(reason);
        Ok(())
    }

    /// Pending → Cancelled. Only asynchronous brokers have a use for this.
    pub fn cancel(&mut self) -> Result<(), OrderStateError> {
        self.transition(OrderStatus::Cancelled)
    }

    fn transition(&mut self, to: OrderStatus) -> Result<(), OrderStateError> {
        if self.status.is_terminal() {
            return Err(OrderStateError {
                order_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
