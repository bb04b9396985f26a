//! Engine: bar-by-bar event replay.
//!
//! For each bar, in timestamp order:
//! 1. Push one `MarketEvent`.
//! 2. Pop and dispatch until the queue is empty:
//!    - Market → `strategy.on_bar`, emitted signals are queued
//!    - Signal → sized into an order and queued (size 0 is dropped)
//!    - Order  → broker; a fill is queued, a rejection closes the order
//!    - Fill   → portfolio ledger, then `strategy.on_fill`
//! 3. Append one equity snapshot at the bar's close.
//!
//! Everything a bar triggers resolves before the next bar's market event exists.
//! Rejections are logged and recorded on the order; strategy errors abort the run.

use super::sizing::{resolve_quantity, SizingInputs};
use super::state::{EngineError, RunResult};
use crate::config::EngineConfig;
use crate::data::BarSeries;
use crate::domain::{Bar, IdGen, Order, OrderId, Portfolio};
use crate::event::{Event, EventQueue, FillEvent, MarketEvent, OrderEvent, SignalEvent};
use crate::execution::{Broker, SimulatedBroker};
use crate::strategy::{Strategy, StrategyContext};
use tracing::{debug, info, trace};

pub struct Engine {
    config: EngineConfig,
    queue: EventQueue,
    ids: IdGen,
    orders: Vec<Order>,
}

/// Where the engine is in the bar loop, passed to handlers.
struct Cursor<'a> {
    bars: &'a BarSeries,
    index: usize,
    bar: &'a Bar,
    strategy_name: &'a str,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            queue: EventQueue::new(),
            ids: IdGen::new(),
            orders: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replay `bars` through `strategy`, executing against `broker` and booking into
    /// `portfolio`. The portfolio should be fresh; its initial capital is reported.
    pub fn run(
        &mut self,
        bars: &BarSeries,
        strategy: &mut dyn Strategy,
        portfolio: &mut Portfolio,
        broker: &mut dyn Broker,
    ) -> Result<RunResult, EngineError> {
        self.queue.clear();
        self.ids = IdGen::new();
        self.orders.clear();

        let strategy_name = strategy.name().to_string();
        info!(
            symbol = %self.config.symbol,
            strategy = %strategy_name,
            bars = bars.len(),
            "backtest started"
        );

        strategy
            .init(bars)
            .map_err(|source| EngineError::StrategyInit {
                strategy: strategy_name.clone(),
                source,
            })?;

        for (index, bar) in bars.iter().enumerate() {
            let cursor = Cursor {
                bars,
                index,
                bar,
                strategy_name: &strategy_name,
            };
            self.queue.push(Event::Market(MarketEvent {
                timestamp: bar.timestamp,
                bar_index: index,
            }));

            while let Some(event) = self.queue.pop() {
                trace!(bar = index, kind = event.kind(), "dispatch");
                match event {
                    Event::Market(_) => self.on_market(&cursor, strategy, portfolio)?,
                    Event::Signal(signal) => self.on_signal(&cursor, signal, portfolio),
                    Event::Order(order) => self.on_order(&cursor, order, portfolio, broker)?,
                    Event::Fill(fill) => self.on_fill(&cursor, fill, strategy, portfolio)?,
                }
            }

            portfolio.record_snapshot(bar.timestamp, bar.close);
        }

        let result = RunResult {
            symbol: self.config.symbol.clone(),
            strategy_name,
            initial_capital: portfolio.initial_capital(),
            bars: bars.clone(),
            equity_curve: portfolio.equity_curve().to_vec(),
            trades: portfolio.trades().to_vec(),
            orders: std::mem::take(&mut self.orders),
        };
        info!(
            trades = result.trades.len(),
            orders = result.orders.len(),
            final_equity = result.final_equity(),
            "backtest finished"
        );
        Ok(result)
    }

    fn on_market(
        &mut self,
        cursor: &Cursor<'_>,
        strategy: &mut dyn Strategy,
        portfolio: &Portfolio,
    ) -> Result<(), EngineError> {
        let mut ctx = StrategyContext::new(cursor.bars, cursor.index, portfolio, &self.config.symbol);
        strategy
            .on_bar(&mut ctx, cursor.bar)
            .map_err(|source| EngineError::Strategy {
                strategy: cursor.strategy_name.to_string(),
                bar_index: cursor.index,
                timestamp: cursor.bar.timestamp,
                source,
            })?;
        for signal in ctx.into_signals() {
            self.queue.push(Event::Signal(signal));
        }
        Ok(())
    }

    fn on_signal(&mut self, cursor: &Cursor<'_>, signal: SignalEvent, portfolio: &Portfolio) {
        let inputs = SizingInputs {
            close: cursor.bar.close,
            cash: portfolio.cash(),
            position: portfolio.position(),
            lot_size: self.config.lot_size,
            cash_fraction: self.config.cash_fraction,
        };
        let quantity = resolve_quantity(signal.side, signal.quantity, &inputs);
        if quantity == 0 {
            info!(
                bar = cursor.index,
                side = %signal.side,
                "signal dropped: sized to zero"
            );
            return;
        }

        let order_id = self.ids.next_order_id();
        self.orders.push(Order::new(
            order_id,
            signal.timestamp,
            cursor.index,
            signal.symbol.clone(),
            signal.side,
            signal.order_type,
            quantity,
        ));
        self.queue.push(Event::Order(OrderEvent {
            order_id,
            timestamp: signal.timestamp,
            symbol: signal.symbol,
            side: signal.side,
            order_type: signal.order_type,
            quantity,
        }));
    }

    fn on_order(
        &mut self,
        cursor: &Cursor<'_>,
        order: OrderEvent,
        portfolio: &Portfolio,
        broker: &mut dyn Broker,
    ) -> Result<(), EngineError> {
        match broker.execute(&order, cursor.bar, portfolio) {
            Ok(fill) => {
                debug!(
                    order = %order.order_id,
                    price = fill.fill_price,
                    quantity = fill.quantity,
                    "order filled by broker"
                );
                self.queue.push(Event::Fill(fill));
                Ok(())
            }
            Err(reason) => {
                info!(
                    bar = cursor.index,
                    order = %order.order_id,
                    side = %order.side,
                    %reason,
                    "order rejected"
                );
                self.order_mut(order.order_id)?.reject(reason)?;
                Ok(())
            }
        }
    }

    fn on_fill(
        &mut self,
        cursor: &Cursor<'_>,
        fill: FillEvent,
        strategy: &mut dyn Strategy,
        portfolio: &mut Portfolio,
    ) -> Result<(), EngineError> {
        match portfolio.execute_fill(&fill) {
            Ok(_) => {
                self.order_mut(fill.order_id)?
                    .fill(fill.fill_price, fill.quantity, fill.commission)?;
                strategy
                    .on_fill(&fill)
                    .map_err(|source| EngineError::Strategy {
                        strategy: cursor.strategy_name.to_string(),
                        bar_index: cursor.index,
                        timestamp: cursor.bar.timestamp,
                        source,
                    })
            }
            Err(reason) => {
                info!(
                    bar = cursor.index,
                    order = %fill.order_id,
                    %reason,
                    "fill rejected by ledger"
                );
                self.order_mut(fill.order_id)?.reject(reason)?;
                Ok(())
            }
        }
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut Order, EngineError> {
        self.orders
            .iter_mut()
            .rev()
            .find(|o| o.id == id)
            .ok_or(EngineError::UnknownOrder(id))
    }
}

/// Run with a fresh portfolio and a `SimulatedBroker` built from `config`.
pub fn run_backtest(
    bars: &BarSeries,
    strategy: &mut dyn Strategy,
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    let mut engine = Engine::new(config.clone())?;
    let mut portfolio = Portfolio::from_config(config)?;
    let mut broker = SimulatedBroker::new();
    engine.run(bars, strategy, &mut portfolio, &mut broker)
}
