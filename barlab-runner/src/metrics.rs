//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or round trips in, scalar out.
//! Annualisation assumes 252 trading days; Sharpe and Sortino subtract a 3% annual
//! risk-free rate by default.

use barlab_core::domain::Trade;
use serde::{Deserialize, Serialize};

use crate::round_trip::RoundTrip;

pub const TRADING_DAYS: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    /// Largest peak-to-trough decline, as a positive fraction.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_bars: usize,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub win_rate: f64,
    /// Average winning PnL over average losing PnL.
    ///
    /// `None` when there are no losing round trips, including when nothing was
    /// paired at all. The ratio is undefined there; it is not reported as the
    /// average win, nor as zero. The JSON export writes it as `null`.
    pub profit_loss_ratio: Option<f64>,
    pub round_trip_count: usize,
    pub fill_count: usize,
    pub total_commission: f64,
    pub total_slippage: f64,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[f64], round_trips: &[RoundTrip], trades: &[Trade]) -> Self {
        Self::compute_with_rate(equity_curve, round_trips, trades, DEFAULT_RISK_FREE_RATE)
    }

    pub fn compute_with_rate(
        equity_curve: &[f64],
        round_trips: &[RoundTrip],
        trades: &[Trade],
        risk_free_rate: f64,
    ) -> Self {
        Self {
            total_return: total_return(equity_curve),
            annualized_return: annualized_return(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            max_drawdown_bars: max_drawdown_duration(equity_curve),
            volatility: volatility(equity_curve),
            sharpe: sharpe_ratio(equity_curve, risk_free_rate),
            sortino: sortino_ratio(equity_curve, risk_free_rate),
            calmar: calmar_ratio(equity_curve),
            win_rate: win_rate(round_trips),
            profit_loss_ratio: profit_loss_ratio(round_trips),
            round_trip_count: round_trips.len(),
            fill_count: trades.len(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            total_slippage: trades.iter().map(|t| t.slippage).sum(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (last − first) / first.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&first), Some(&last)) if equity_curve.len() >= 2 && first > 0.0 => {
            (last - first) / first
        }
        _ => 0.0,
    }
}

/// (1 + total_return) ^ (252 / bars) − 1. Zero for one bar or less.
pub fn annualized_return(equity_curve: &[f64]) -> f64 {
    let n = equity_curve.len();
    if n <= 1 {
        return 0.0;
    }
    let growth = 1.0 + total_return(equity_curve);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS / n as f64) - 1.0
}

/// Maximum drawdown as a positive fraction (0.15 = 15% below the running peak).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd
}

/// Longest run of consecutive bars strictly below the running peak.
pub fn max_drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0;
    let mut longest = 0;
    for &eq in equity_curve {
        if eq < peak {
            current += 1;
            longest = longest.max(current);
        } else {
            peak = eq;
            current = 0;
        }
    }
    longest
}

/// Annualised standard deviation of daily returns.
pub fn volatility(equity_curve: &[f64]) -> f64 {
    std_dev(&daily_returns(equity_curve)) * TRADING_DAYS.sqrt()
}

/// Sharpe = mean(daily excess) / std(daily excess) × sqrt(252).
///
/// Zero when returns are flat or there are fewer than two of them.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    let std = std_dev(&excess);
    if excess.len() < 2 || std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / std * TRADING_DAYS.sqrt()
}

/// Sortino: like Sharpe, but divides by the sample std of negative excess returns.
pub fn sortino_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = std_dev(&downside);
    if downside.len() < 2 || downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / downside_std * TRADING_DAYS.sqrt()
}

/// Calmar: annualised return / max drawdown. Zero without a drawdown.
pub fn calmar_ratio(equity_curve: &[f64]) -> f64 {
    let dd = max_drawdown(equity_curve);
    if dd <= 0.0 {
        return 0.0;
    }
    annualized_return(equity_curve) / dd
}

/// Fraction of round trips with positive PnL.
pub fn win_rate(round_trips: &[RoundTrip]) -> f64 {
    if round_trips.is_empty() {
        return 0.0;
    }
    let winners = round_trips.iter().filter(|t| t.is_winner()).count();
    winners as f64 / round_trips.len() as f64
}

/// `None` unless at least one round trip lost money.
pub fn profit_loss_ratio(round_trips: &[RoundTrip]) -> Option<f64> {
    let wins: Vec<f64> = round_trips.iter().map(|t| t.pnl).filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = round_trips.iter().map(|t| -t.pnl).filter(|p| *p > 0.0).collect();
    if losses.is_empty() {
        return None;
    }
    Some(mean_f64(&wins) / mean_f64(&losses))
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Bar-over-bar returns from an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(equity_curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let daily_rf = risk_free_rate / TRADING_DAYS;
    daily_returns(equity_curve).into_iter().map(|r| r - daily_rf).collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rt(pnl: f64) -> RoundTrip {
        let t = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RoundTrip {
            entry_time: t,
            exit_time: t,
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 10.0,
            quantity: 10,
            commission: 0.0,
            pnl,
            return_pct: pnl / 1_000.0,
            holding_bars: 1,
        }
    }

    #[test]
    fn total_and_annualized_return() {
        let curve = [100.0, 110.0, 121.0];
        assert!((total_return(&curve) - 0.21).abs() < 1e-12);
        let expected = 1.21_f64.powf(252.0 / 3.0) - 1.0;
        assert!((annualized_return(&curve) - expected).abs() < 1e-9);
        assert_eq!(annualized_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn drawdown_depth_and_duration() {
        let curve = [100.0, 120.0, 90.0, 100.0, 110.0, 125.0, 120.0];
        assert!((max_drawdown(&curve) - 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown_duration(&curve), 3);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown_duration(&[1.0, 2.0, 3.0]), 0);
    }

    #[test]
    fn flat_curve_has_zero_ratios() {
        let curve = [100.0; 10];
        assert_eq!(sharpe_ratio(&curve, 0.0), 0.0);
        assert_eq!(sortino_ratio(&curve, 0.0), 0.0);
        assert_eq!(calmar_ratio(&curve), 0.0);
        assert_eq!(volatility(&curve), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_drift() {
        let up: Vec<f64> = (0..50).map(|i| 100.0 * (1.0 + 0.01 * (i % 3) as f64 + 0.002 * i as f64)).collect();
        assert!(sharpe_ratio(&up, 0.0) > 0.0);
        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert!(sharpe_ratio(&down, 0.0) < 0.0);
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        let curve = [100.0, 101.0, 100.0, 102.0];
        let r = daily_returns(&curve);
        let expected = mean_f64(&r) / std_dev(&r) * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&curve, 0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn win_rate_and_pl_ratio() {
        let trips = [rt(100.0), rt(-50.0), rt(200.0), rt(-150.0)];
        assert!((win_rate(&trips) - 0.5).abs() < 1e-12);
        // avg win 150 / avg loss 100
        assert!((profit_loss_ratio(&trips).unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(profit_loss_ratio(&[rt(10.0)]), None);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn pl_ratio_is_undefined_without_losses() {
        assert_eq!(profit_loss_ratio(&[]), None);
        assert_eq!(profit_loss_ratio(&[rt(10.0), rt(30.0)]), None);
        // Break-even trips are neither wins nor losses.
        assert_eq!(profit_loss_ratio(&[rt(0.0)]), None);
        // Losses only: no winners averages to zero.
        assert_eq!(profit_loss_ratio(&[rt(-20.0)]), Some(0.0));

        let m = PerformanceMetrics::compute(&[100.0, 110.0], &[rt(10.0)], &[]);
        assert_eq!(m.profit_loss_ratio, None);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"profit_loss_ratio\":null"));
    }

    #[test]
    fn compute_counts_fills_and_costs() {
        let m = PerformanceMetrics::compute(&[100.0, 100.0], &[rt(5.0)], &[]);
        assert_eq!(m.round_trip_count, 1);
        assert_eq!(m.fill_count, 0);
        assert_eq!(m.total_commission, 0.0);
        assert_eq!(m.win_rate, 1.0);
    }
}
