//! Per-bar strategy context.
//!
//! Built fresh by the engine for every `on_bar` call. It borrows the bar table and
//! the portfolio read-only and collects the signals the strategy emits; the engine
//! drains them into the event queue once the call returns.

use crate::data::BarSeries;
use crate::domain::{Bar, OrderSide, OrderType, Portfolio};
use crate::event::SignalEvent;

/// Quantity and order type for a buy or sell. `quantity == 0` lets the engine size it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub quantity: u64,
    pub order_type: OrderType,
}

impl OrderRequest {
    pub fn market(quantity: u64) -> Self {
        Self {
            quantity,
            order_type: OrderType::Market,
        }
    }

    pub fn limit(quantity: u64, limit_price: f64) -> Self {
        Self {
            quantity,
            order_type: OrderType::Limit { limit_price },
        }
    }
}

impl Default for OrderRequest {
    fn default() -> Self {
        Self::market(0)
    }
}

pub struct StrategyContext<'a> {
    bars: &'a BarSeries,
    index: usize,
    portfolio: &'a Portfolio,
    symbol: &'a str,
    signals: Vec<SignalEvent>,
}

impl<'a> StrategyContext<'a> {
    /// `index` must be a valid position in `bars`.
    pub fn new(bars: &'a BarSeries, index: usize, portfolio: &'a Portfolio, symbol: &'a str) -> Self {
        Self {
            bars,
            index,
            portfolio,
            symbol,
            signals: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bar(&self) -> &'a Bar {
        &self.bars.bars()[self.index]
    }

    /// The last `n` bars up to and including the current one.
    pub fn history(&self, n: usize) -> &'a [Bar] {
        let end = self.index + 1;
        let start = end.saturating_sub(n);
        &self.bars.bars()[start..end]
    }

    /// The full bar table, including bars after the current one.
    pub fn data(&self) -> &'a BarSeries {
        self.bars
    }

    pub fn symbol(&self) -> &'a str {
        self.symbol
    }

    pub fn position(&self) -> u64 {
        self.portfolio.position()
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash()
    }

    pub fn avg_cost(&self) -> f64 {
        self.portfolio.avg_cost()
    }

    /// Market buy. `0` means engine-sized.
    pub fn buy(&mut self, quantity: u64) {
        self.buy_with(OrderRequest::market(quantity));
    }

    /// Market sell. `0` means the whole position.
    pub fn sell(&mut self, quantity: u64) {
        self.sell_with(OrderRequest::market(quantity));
    }

    pub fn buy_with(&mut self, request: OrderRequest) {
        self.emit(OrderSide::Buy, request);
    }

    pub fn sell_with(&mut self, request: OrderRequest) {
        self.emit(OrderSide::Sell, request);
    }

    pub fn pending_signals(&self) -> &[SignalEvent] {
        &self.signals
    }

    pub fn into_signals(self) -> Vec<SignalEvent> {
        self.signals
    }

    fn emit(&mut self, side: OrderSide, request: OrderRequest) {
        self.signals.push(SignalEvent {
            timestamp: self.bar().timestamp,
            symbol: self.symbol.to_string(),
            side,
            quantity: request.quantity,
            order_type: request.order_type,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::CostModel;
    use crate::indicators::series_from_closes;

    #[test]
    fn history_includes_current_bar() {
        let bars = series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let portfolio = Portfolio::new(1_000.0, CostModel::frictionless()).unwrap();
        let ctx = StrategyContext::new(&bars, 3, &portfolio, "SPY");
        let hist = ctx.history(2);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[0].close, 3.0);
        assert_eq!(hist[1].close, 4.0);
        assert_eq!(ctx.history(100).len(), 4);
        assert_eq!(ctx.bar().close, 4.0);
        assert_eq!(ctx.data().len(), 5);
    }

    #[test]
    fn signals_carry_current_timestamp_and_symbol() {
        let bars = series_from_closes(&[10.0, 11.0]);
        let portfolio = Portfolio::new(1_000.0, CostModel::frictionless()).unwrap();
        let mut ctx = StrategyContext::new(&bars, 1, &portfolio, "SPY");
        ctx.buy(0);
        ctx.sell_with(OrderRequest::limit(5, 12.0));
        assert_eq!(ctx.pending_signals().len(), 2);

        let signals = ctx.into_signals();
        assert_eq!(signals[0].side, OrderSide::Buy);
        assert_eq!(signals[0].quantity, 0);
        assert_eq!(signals[0].timestamp, bars.bars()[1].timestamp);
        assert_eq!(signals[1].order_type, OrderType::Limit { limit_price: 12.0 });
        assert_eq!(signals[1].symbol, "SPY");
    }

    #[test]
    fn reads_portfolio_state() {
        let bars = series_from_closes(&[10.0]);
        let portfolio = Portfolio::new(1_000.0, CostModel::frictionless()).unwrap();
        let ctx = StrategyContext::new(&bars, 0, &portfolio, "SPY");
        assert_eq!(ctx.cash(), 1_000.0);
        assert_eq!(ctx.position(), 0);
        assert_eq!(ctx.avg_cost(), 0.0);
    }
}
