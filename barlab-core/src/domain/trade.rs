//! Trade: an accepted fill as recorded in the ledger's history.

use super::ids::OrderId;
use super::order::OrderSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One accepted fill. Appended once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub order_id: OrderId,
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: u64,
    pub commission: f64,
    pub slippage: f64,
}

impl Trade {
    /// Price times quantity, before fees.
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// Signed cash change this trade caused.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission),
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(side: OrderSide) -> Trade {
        Trade {
            order_id: OrderId(1),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            symbol: "SPY".into(),
            side,
            price: 10.0,
            quantity: 100,
            commission: 5.0,
            slippage: 1.0,
        }
    }

    #[test]
    fn buy_cash_flow_includes_commission() {
        assert_eq!(trade(OrderSide::Buy).cash_flow(), -1005.0);
    }

    #[test]
    fn sell_cash_flow_nets_commission() {
        assert_eq!(trade(OrderSide::Sell).cash_flow(), 995.0);
    }
}
