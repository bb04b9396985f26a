//! Default order sizing for signals that leave quantity to the engine.
//!
//! - Sell: the whole current position.
//! - Buy: `cash × cash_fraction / close`, floored to whole shares and then to a
//!   multiple of `lot_size`.
//!
//! The cash fraction leaves headroom for fees and slippage but does not guarantee
//! the order clears; extreme cost settings can still get it rejected.

use crate::domain::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInputs {
    pub close: f64,
    pub cash: f64,
    pub position: u64,
    pub lot_size: u64,
    pub cash_fraction: f64,
}

pub fn default_quantity(side: OrderSide, inputs: &SizingInputs) -> u64 {
    match side {
        OrderSide::Sell => inputs.position,
        OrderSide::Buy => {
            if !(inputs.close.is_finite() && inputs.close > 0.0) || inputs.cash <= 0.0 {
                return 0;
            }
            let shares = (inputs.cash * inputs.cash_fraction / inputs.close).floor();
            if shares < 1.0 {
                return 0;
            }
            let shares = shares as u64;
            let lot = inputs.lot_size.max(1);
            shares - shares % lot
        }
    }
}

/// Requested quantity if positive, default otherwise.
pub fn resolve_quantity(side: OrderSide, requested: u64, inputs: &SizingInputs) -> u64 {
    if requested > 0 {
        requested
    } else {
        default_quantity(side, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(cash: f64, close: f64, lot_size: u64) -> SizingInputs {
        SizingInputs {
            close,
            cash,
            position: 300,
            lot_size,
            cash_fraction: 0.95,
        }
    }

    #[test]
    fn buy_spends_95_percent_of_cash() {
        // 100_000 * 0.95 / 10 = 9500
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(100_000.0, 10.0, 1)), 9_500);
    }

    #[test]
    fn buy_floors_to_lot() {
        // 100_000 * 0.95 / 33 = 2878.78 -> 2878 -> 2800
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(100_000.0, 33.0, 100)), 2_800);
    }

    #[test]
    fn buy_below_one_lot_is_zero() {
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(1_000.0, 20.0, 100)), 0);
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(10.0, 20.0, 1)), 0);
    }

    #[test]
    fn buy_with_bad_close_is_zero() {
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(1_000.0, 0.0, 1)), 0);
        assert_eq!(default_quantity(OrderSide::Buy, &inputs(1_000.0, -5.0, 1)), 0);
    }

    #[test]
    fn sell_takes_whole_position() {
        assert_eq!(default_quantity(OrderSide::Sell, &inputs(0.0, 10.0, 100)), 300);
    }

    #[test]
    fn explicit_quantity_is_kept() {
        let i = inputs(100_000.0, 10.0, 100);
        assert_eq!(resolve_quantity(OrderSide::Buy, 7, &i), 7);
        assert_eq!(resolve_quantity(OrderSide::Sell, 0, &i), 300);
    }
}
