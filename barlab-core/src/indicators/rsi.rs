//! Relative Strength Index (RSI).
//!
//! Simple (not Wilder) averaging: mean gain and mean loss over the last `period`
//! close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → 100 (or NaN if avg_gain is also 0).

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let prices = closes(bars);
        let n = prices.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        // changes[i - 1] is the move into bar i
        for i in self.period..n {
            let window = &changes[i - self.period..i];
            let gain = window.iter().filter(|c| **c > 0.0).sum::<f64>() / self.period as f64;
            let loss = -window.iter().filter(|c| **c < 0.0).sum::<f64>() / self.period as f64;
            result[i] = rsi_value(gain, loss);
        }
        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return f64::NAN;
        }
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_warmup_is_period() {
        let bars = make_bars(&[10.0, 11.0, 10.5, 11.5, 12.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert!(!result[3].is_nan());
    }

    #[test]
    fn rsi_simple_average() {
        // changes: +1, -0.5, +1, +0.5
        let bars = make_bars(&[10.0, 11.0, 10.5, 11.5, 12.0]);
        let result = Rsi::new(3).compute(&bars);
        // bar 3: gains (1 + 1)/3, losses 0.5/3 -> rs = 4 -> 80
        assert_approx(result[3], 80.0, DEFAULT_EPSILON);
        // bar 4: gains (1 + 0.5)/3, losses 0.5/3 -> rs = 3 -> 75
        assert_approx(result[4], 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_is_nan() {
        let bars = make_bars(&[5.0; 6]);
        assert!(Rsi::new(3).compute(&bars)[5].is_nan());
    }

    #[test]
    fn rsi_is_bounded() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        for v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }
}
