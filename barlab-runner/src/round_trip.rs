//! Round trips: buys paired with later sells, first in first out, by quantity.
//!
//! A sell closes the oldest open lots first and may span several of them; a lot
//! may be closed by several sells. Commissions are split pro rata by quantity on
//! both legs, so the sum of round-trip PnL equals realized cash PnL.

use std::collections::VecDeque;

use barlab_core::data::BarSeries;
use barlab_core::domain::{OrderSide, Trade};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: u64,
    /// Entry and exit commission allocated to this quantity.
    pub commission: f64,
    /// `(exit − entry) × quantity − commission`.
    pub pnl: f64,
    /// `(exit − entry) / entry`, before costs.
    pub return_pct: f64,
    pub holding_bars: usize,
}

impl RoundTrip {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

struct OpenLot {
    time: NaiveDateTime,
    bar: usize,
    price: f64,
    remaining: u64,
    commission_per_share: f64,
}

/// Pair `trades` into round trips. Shares still open at the end are left out.
pub fn round_trips(trades: &[Trade], bars: &BarSeries) -> Vec<RoundTrip> {
    let bar_index = |ts: NaiveDateTime| bars.bars().partition_point(|b| b.timestamp < ts);
    let mut lots: VecDeque<OpenLot> = VecDeque::new();
    let mut out = Vec::new();

    for trade in trades {
        match trade.side {
            OrderSide::Buy => lots.push_back(OpenLot {
                time: trade.timestamp,
                bar: bar_index(trade.timestamp),
                price: trade.price,
                remaining: trade.quantity,
                commission_per_share: trade.commission / trade.quantity as f64,
            }),
            OrderSide::Sell => {
                let exit_bar = bar_index(trade.timestamp);
                let sell_commission_per_share = trade.commission / trade.quantity as f64;
                let mut to_close = trade.quantity;
                while to_close > 0 {
                    let Some(lot) = lots.front_mut() else { break };
                    let qty = to_close.min(lot.remaining);
                    let commission =
                        (lot.commission_per_share + sell_commission_per_share) * qty as f64;
                    out.push(RoundTrip {
                        entry_time: lot.time,
                        exit_time: trade.timestamp,
                        entry_price: lot.price,
                        exit_price: trade.price,
                        quantity: qty,
                        commission,
                        pnl: (trade.price - lot.price) * qty as f64 - commission,
                        return_pct: (trade.price - lot.price) / lot.price,
                        holding_bars: exit_bar.saturating_sub(lot.bar),
                    });
                    lot.remaining -= qty;
                    to_close -= qty;
                    if lot.remaining == 0 {
                        lots.pop_front();
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use barlab_core::domain::{Bar, OrderId};
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bars(days: u32) -> BarSeries {
        BarSeries::new(
            (1..=days)
                .map(|d| Bar {
                    timestamp: ts(d),
                    open: 10.0,
                    high: 11.0,
                    low: 9.0,
                    close: 10.0,
                    volume: 1.0,
                })
                .collect(),
        )
        .unwrap()
    }

    fn trade(day: u32, side: OrderSide, price: f64, quantity: u64, commission: f64) -> Trade {
        Trade {
            order_id: OrderId(day as u64),
            timestamp: ts(day),
            symbol: "X".into(),
            side,
            price,
            quantity,
            commission,
            slippage: 0.0,
        }
    }

    #[test]
    fn single_round_trip() {
        let trades = [
            trade(1, OrderSide::Buy, 10.0, 100, 5.0),
            trade(4, OrderSide::Sell, 12.0, 100, 6.0),
        ];
        let rts = round_trips(&trades, &bars(5));
        assert_eq!(rts.len(), 1);
        let rt = &rts[0];
        assert_eq!(rt.quantity, 100);
        assert!((rt.pnl - (200.0 - 11.0)).abs() < 1e-9);
        assert!((rt.return_pct - 0.2).abs() < 1e-12);
        assert_eq!(rt.holding_bars, 3);
        assert!(rt.is_winner());
    }

    #[test]
    fn partial_sells_split_lots_fifo() {
        let trades = [
            trade(1, OrderSide::Buy, 10.0, 100, 10.0),
            trade(2, OrderSide::Buy, 20.0, 100, 10.0),
            trade(3, OrderSide::Sell, 15.0, 150, 15.0),
            trade(5, OrderSide::Sell, 15.0, 50, 5.0),
        ];
        let rts = round_trips(&trades, &bars(5));
        assert_eq!(rts.len(), 3);
        assert_eq!((rts[0].entry_price, rts[0].quantity), (10.0, 100));
        assert_eq!((rts[1].entry_price, rts[1].quantity), (20.0, 50));
        assert_eq!((rts[2].entry_price, rts[2].quantity), (20.0, 50));
        // first: 500 gain − (10 + 10) commission
        assert!((rts[0].pnl - 480.0).abs() < 1e-9);
        // second: −250 − (5 + 5)
        assert!((rts[1].pnl + 260.0).abs() < 1e-9);

        let total: f64 = rts.iter().map(|r| r.pnl).sum();
        let cash_pnl = -(1_000.0 + 10.0) - (2_000.0 + 10.0) + (2_250.0 - 15.0) + (750.0 - 5.0);
        assert!((total - cash_pnl).abs() < 1e-9);
    }

    #[test]
    fn open_position_is_not_a_round_trip() {
        let trades = [trade(1, OrderSide::Buy, 10.0, 100, 0.0)];
        assert!(round_trips(&trades, &bars(3)).is_empty());
    }
}
