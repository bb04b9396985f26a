//! Cost model: slippage and commission calculation.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Commission follows one of two fee models:
//! - `Proportional`: `amount × rate`, nothing else.
//! - `FloorAndTax`: `max(amount × rate, min_commission)`, plus `amount × sell_tax_rate`
//!   on sells only.
//!
//! Slipped prices and commissions are rounded to the configured number of decimals
//! (half away from zero). `None` disables rounding.

use crate::config::ConfigError;
use crate::domain::OrderSide;
use serde::{Deserialize, Serialize};

/// Which commission formula applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModel {
    Proportional,
    FloorAndTax,
}

/// Execution friction owned by the portfolio and read by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub fee_model: FeeModel,
    /// Commission as a fraction of trade amount.
    pub commission_rate: f64,
    /// Commission floor per fill. Only used by `FloorAndTax`.
    pub min_commission: f64,
    /// Extra tax on sell amount. Only used by `FloorAndTax`.
    pub sell_tax_rate: f64,
    /// Adverse price move as a fraction of the base fill price.
    pub slippage: f64,
    pub price_decimals: Option<u32>,
    pub fee_decimals: Option<u32>,
}

pub const DEFAULT_COMMISSION_RATE: f64 = 0.0003;
pub const DEFAULT_SLIPPAGE: f64 = 0.001;
pub const DEFAULT_MIN_COMMISSION: f64 = 5.0;
pub const DEFAULT_SELL_TAX_RATE: f64 = 0.001;

impl CostModel {
    /// Floor-and-tax fees with the default A-share parameters.
    pub fn floor_and_tax() -> Self {
        Self {
            fee_model: FeeModel::FloorAndTax,
            commission_rate: DEFAULT_COMMISSION_RATE,
            min_commission: DEFAULT_MIN_COMMISSION,
            sell_tax_rate: DEFAULT_SELL_TAX_RATE,
            slippage: DEFAULT_SLIPPAGE,
            price_decimals: Some(4),
            fee_decimals: Some(2),
        }
    }

    /// Proportional fees with the default rate and slippage.
    pub fn proportional() -> Self {
        Self {
            fee_model: FeeModel::Proportional,
            min_commission: 0.0,
            sell_tax_rate: 0.0,
            ..Self::floor_and_tax()
        }
    }

    /// No fees, no slippage, no rounding.
    pub fn frictionless() -> Self {
        Self {
            fee_model: FeeModel::Proportional,
            commission_rate: 0.0,
            min_commission: 0.0,
            sell_tax_rate: 0.0,
            slippage: 0.0,
            price_decimals: None,
            fee_decimals: None,
        }
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_min_commission(mut self, min_commission: f64) -> Self {
        self.min_commission = min_commission;
        self
    }

    pub fn with_sell_tax_rate(mut self, rate: f64) -> Self {
        self.sell_tax_rate = rate;
        self
    }

    /// Apply slippage to a base fill price.
    pub fn slipped_price(&self, base_price: f64, side: OrderSide) -> f64 {
        let raw = match side {
            OrderSide::Buy => base_price * (1.0 + self.slippage),
            OrderSide::Sell => base_price * (1.0 - self.slippage),
        };
        round_opt(raw, self.price_decimals)
    }

    /// Commission for a fill of `quantity` at `price`.
    pub fn commission(&self, price: f64, quantity: u64, side: OrderSide) -> f64 {
        let amount = price * quantity as f64;
        let fee = match self.fee_model {
            FeeModel::Proportional => amount * self.commission_rate,
            FeeModel::FloorAndTax => {
                let base = (amount * self.commission_rate).max(self.min_commission);
                match side {
                    OrderSide::Buy => base,
                    OrderSide::Sell => base + amount * self.sell_tax_rate,
                }
            }
        };
        round_opt(fee, self.fee_decimals)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("commission_rate", self.commission_rate),
            ("min_commission", self.min_commission),
            ("sell_tax_rate", self.sell_tax_rate),
            ("slippage", self.slippage),
        ];
        for (field, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeRate { field, value });
            }
        }
        if self.slippage >= 1.0 {
            return Err(ConfigError::SlippageTooLarge(self.slippage));
        }
        Ok(())
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::floor_and_tax()
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

fn round_opt(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(d) => round_to(value, d),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_is_identity() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.slipped_price(100.0, OrderSide::Buy), 100.0);
        assert_eq!(cost.slipped_price(100.0, OrderSide::Sell), 100.0);
        assert_eq!(cost.commission(100.0, 50, OrderSide::Sell), 0.0);
    }

    #[test]
    fn buy_slippage_increases_price() {
        let cost = CostModel::proportional();
        // 10.0 * 1.001 = 10.01
        assert_eq!(cost.slipped_price(10.0, OrderSide::Buy), 10.01);
    }

    #[test]
    fn sell_slippage_decreases_price() {
        let cost = CostModel::proportional();
        assert_eq!(cost.slipped_price(10.0, OrderSide::Sell), 9.99);
    }

    #[test]
    fn slipped_price_rounds_to_four_decimals() {
        let cost = CostModel::proportional();
        // 12.3456 * 1.001 = 12.3579456
        assert_eq!(cost.slipped_price(12.3456, OrderSide::Buy), 12.3579);
    }

    #[test]
    fn proportional_commission_has_no_floor() {
        let cost = CostModel::proportional();
        // 10 * 100 * 0.0003 = 0.30
        assert_eq!(cost.commission(10.0, 100, OrderSide::Buy), 0.3);
        assert_eq!(cost.commission(10.0, 100, OrderSide::Sell), 0.3);
    }

    #[test]
    fn floor_applies_to_small_trades() {
        let cost = CostModel::floor_and_tax();
        // 1000 * 0.0003 = 0.30 < 5.0 floor
        assert_eq!(cost.commission(10.0, 100, OrderSide::Buy), 5.0);
    }

    #[test]
    fn sell_tax_is_added_on_sells_only() {
        let cost = CostModel::floor_and_tax();
        // amount = 100_000: commission 30.0, tax 100.0
        assert_eq!(cost.commission(100.0, 1000, OrderSide::Buy), 30.0);
        assert_eq!(cost.commission(100.0, 1000, OrderSide::Sell), 130.0);
    }

    #[test]
    fn commission_rounds_to_cents() {
        let cost = CostModel::proportional().with_commission_rate(0.00033);
        // 12345.67 * 0.00033 = 4.0740711
        assert_eq!(cost.commission(12345.67, 1, OrderSide::Buy), 4.07);
    }

    #[test]
    fn negative_rate_fails_validation() {
        let cost = CostModel::proportional().with_slippage(-0.01);
        assert!(matches!(
            cost.validate(),
            Err(ConfigError::NegativeRate { field: "slippage", .. })
        ));
        assert!(CostModel::floor_and_tax().validate().is_ok());
    }

    #[test]
    fn round_to_is_half_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }
}
