//! Broker: decides whether and at what price an order executes against one bar.
//!
//! `SimulatedBroker` resolves every order synchronously on the bar it arrives:
//! - Market: base price is the close.
//! - Limit buy: needs `limit >= low`; base price is `min(limit, close)`.
//! - Limit sell: needs `limit <= high`; base price is `max(limit, close)`.
//!
//! A NaN limit satisfies neither bound and is rejected.
//!
//! The base price is then slipped and charged commission through the portfolio's
//! cost model, and the fill is checked against the portfolio's cash and position.
//! No partial fills, no retries.

use crate::domain::{Bar, OrderSide, OrderType, Portfolio, Rejection};
use crate::event::{FillEvent, OrderEvent};

/// Order execution seam. The engine only talks to brokers through this trait.
pub trait Broker {
    fn execute(
        &mut self,
        order: &OrderEvent,
        bar: &Bar,
        portfolio: &Portfolio,
    ) -> Result<FillEvent, Rejection>;
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedBroker {
    orders_seen: u64,
}

impl SimulatedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders handed to this broker so far, filled or not.
    pub fn orders_seen(&self) -> u64 {
        self.orders_seen
    }
}

/// Price the order would execute at before slippage, if the bar allows it.
pub fn base_fill_price(order_type: OrderType, side: OrderSide, bar: &Bar) -> Result<f64, Rejection> {
    match order_type {
        OrderType::Market => Ok(bar.close),
        OrderType::Limit { limit_price } => match side {
            OrderSide::Buy if !(limit_price >= bar.low) => Err(Rejection::LimitNotReached {
                limit: limit_price,
                bound: bar.low,
            }),
            OrderSide::Buy => Ok(limit_price.min(bar.close)),
            OrderSide::Sell if !(limit_price <= bar.high) => Err(Rejection::LimitNotReached {
                limit: limit_price,
                bound: bar.high,
            }),
            OrderSide::Sell => Ok(limit_price.max(bar.close)),
        },
    }
}

impl Broker for SimulatedBroker {
    fn execute(
        &mut self,
        order: &OrderEvent,
        bar: &Bar,
        portfolio: &Portfolio,
    ) -> Result<FillEvent, Rejection> {
        self.orders_seen += 1;
        if order.quantity == 0 {
            return Err(Rejection::ZeroQuantity);
        }

        let base_price = base_fill_price(order.order_type, order.side, bar)?;
        let fill_price = portfolio.slipped_price(base_price, order.side);
        let commission = portfolio.commission(fill_price, order.quantity, order.side);
        portfolio.check_fill(order.side, fill_price, order.quantity, commission)?;

        Ok(FillEvent {
            order_id: order.order_id,
            timestamp: order.timestamp,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            fill_price,
            commission,
            slippage_cost: (fill_price - base_price).abs() * order.quantity as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;
    use crate::execution::CostModel;
    use chrono::NaiveDate;

    fn bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.0,
            volume: 1_000.0,
        }
    }

    fn order(side: OrderSide, order_type: OrderType, quantity: u64) -> OrderEvent {
        OrderEvent {
            order_id: OrderId(1),
            timestamp: bar().timestamp,
            symbol: "SPY".into(),
            side,
            order_type,
            quantity,
        }
    }

    fn frictionless(cash: f64) -> Portfolio {
        Portfolio::new(cash, CostModel::frictionless()).unwrap()
    }

    #[test]
    fn market_order_fills_at_close() {
        let mut broker = SimulatedBroker::new();
        let fill = broker
            .execute(&order(OrderSide::Buy, OrderType::Market, 100), &bar(), &frictionless(10_000.0))
            .unwrap();
        assert_eq!(fill.fill_price, 10.0);
        assert_eq!(fill.commission, 0.0);
        assert_eq!(fill.slippage_cost, 0.0);
        assert_eq!(broker.orders_seen(), 1);
    }

    #[test]
    fn limit_buy_below_low_is_rejected() {
        let mut broker = SimulatedBroker::new();
        let err = broker
            .execute(
                &order(OrderSide::Buy, OrderType::Limit { limit_price: 8.99 }, 10),
                &bar(),
                &frictionless(10_000.0),
            )
            .unwrap_err();
        assert_eq!(err, Rejection::LimitNotReached { limit: 8.99, bound: 9.0 });
        assert_eq!(broker.orders_seen(), 1);
    }

    #[test]
    fn nan_limit_is_rejected_on_both_sides() {
        let nan = OrderType::Limit { limit_price: f64::NAN };
        for side in [OrderSide::Buy, OrderSide::Sell] {
            let err = base_fill_price(nan, side, &bar()).unwrap_err();
            assert!(matches!(err, Rejection::LimitNotReached { limit, .. } if limit.is_nan()));
        }

        let mut broker = SimulatedBroker::new();
        let mut portfolio = frictionless(10_000.0);
        let buy = broker
            .execute(&order(OrderSide::Buy, OrderType::Market, 10), &bar(), &portfolio)
            .unwrap();
        portfolio.execute_fill(&buy).unwrap();
        assert!(broker
            .execute(&order(OrderSide::Sell, nan, 10), &bar(), &portfolio)
            .is_err());
        assert_eq!(portfolio.position(), 10);
    }

    #[test]
    fn limit_buy_fills_at_better_of_limit_and_close() {
        let mut broker = SimulatedBroker::new();
        let p = frictionless(10_000.0);
        let low_limit = OrderType::Limit { limit_price: 9.5 };
        let fill = broker.execute(&order(OrderSide::Buy, low_limit, 10), &bar(), &p).unwrap();
        assert_eq!(fill.fill_price, 9.5);
        let high_limit = OrderType::Limit { limit_price: 10.5 };
        let fill = broker.execute(&order(OrderSide::Buy, high_limit, 10), &bar(), &p).unwrap();
        assert_eq!(fill.fill_price, 10.0);
    }

    #[test]
    fn limit_sell_above_high_is_rejected() {
        let mut broker = SimulatedBroker::new();
        let err = base_fill_price(OrderType::Limit { limit_price: 11.01 }, OrderSide::Sell, &bar())
            .unwrap_err();
        assert!(matches!(err, Rejection::LimitNotReached { .. }));
        // Even with a position the sell is never filled.
        let mut p = frictionless(10_000.0);
        let buy = broker
            .execute(&order(OrderSide::Buy, OrderType::Market, 10), &bar(), &p)
            .unwrap();
        p.execute_fill(&buy).unwrap();
        assert!(broker
            .execute(&order(OrderSide::Sell, OrderType::Limit { limit_price: 11.01 }, 10), &bar(), &p)
            .is_err());
    }

    #[test]
    fn limit_sell_fills_at_max_of_limit_and_close() {
        assert_eq!(
            base_fill_price(OrderType::Limit { limit_price: 10.8 }, OrderSide::Sell, &bar()),
            Ok(10.8)
        );
        assert_eq!(
            base_fill_price(OrderType::Limit { limit_price: 9.2 }, OrderSide::Sell, &bar()),
            Ok(10.0)
        );
    }

    #[test]
    fn slippage_and_commission_come_from_portfolio_costs() {
        let mut broker = SimulatedBroker::new();
        let p = Portfolio::new(100_000.0, CostModel::floor_and_tax()).unwrap();
        let fill = broker
            .execute(&order(OrderSide::Buy, OrderType::Market, 1_000), &bar(), &p)
            .unwrap();
        assert_eq!(fill.fill_price, 10.01);
        // 10_010 * 0.0003 = 3.003 -> floor 5.0
        assert_eq!(fill.commission, 5.0);
        assert!((fill.slippage_cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_buy_is_rejected() {
        let mut broker = SimulatedBroker::new();
        let err = broker
            .execute(&order(OrderSide::Buy, OrderType::Market, 101), &bar(), &frictionless(1_000.0))
            .unwrap_err();
        assert!(matches!(err, Rejection::InsufficientCash { .. }));
    }

    #[test]
    fn sell_without_position_is_rejected() {
        let mut broker = SimulatedBroker::new();
        let err = broker
            .execute(&order(OrderSide::Sell, OrderType::Market, 1), &bar(), &frictionless(1_000.0))
            .unwrap_err();
        assert_eq!(err, Rejection::InsufficientPosition { requested: 1, held: 0 });
    }
}
