//! Run fingerprinting: content hashes for bar tables and run outputs.
//!
//! - `dataset_hash`: identity of the input table.
//! - `result_digest`: identity of an equity curve plus trade history. Two runs
//!   with equal digests produced bit-identical outputs.
//!
//! Both hash raw `f64` bit patterns, so they distinguish values that print the same.

use crate::data::BarSeries;
use crate::domain::{DatasetHash, EquitySnapshot, OrderSide, ResultDigest, Trade};
use crate::engine::RunResult;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub symbol: String,
    pub strategy_name: String,
    pub dataset_hash: DatasetHash,
    pub result_digest: ResultDigest,
    pub bar_count: usize,
    pub trade_count: usize,
}

impl RunFingerprint {
    pub fn of(result: &RunResult) -> Self {
        Self {
            symbol: result.symbol.clone(),
            strategy_name: result.strategy_name.clone(),
            dataset_hash: dataset_hash(&result.bars),
            result_digest: result_digest(&result.equity_curve, &result.trades),
            bar_count: result.bars.len(),
            trade_count: result.trades.len(),
        }
    }
}

pub fn dataset_hash(bars: &BarSeries) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hash_timestamp(&mut hasher, bar.timestamp);
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

pub fn result_digest(equity_curve: &[EquitySnapshot], trades: &[Trade]) -> ResultDigest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(equity_curve.len() as u64).to_le_bytes());
    for snap in equity_curve {
        hash_timestamp(&mut hasher, snap.timestamp);
        for value in [snap.cash, snap.market_value, snap.total_equity] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.update(&snap.position.to_le_bytes());
    }
    hasher.update(&(trades.len() as u64).to_le_bytes());
    for trade in trades {
        hasher.update(&trade.order_id.0.to_le_bytes());
        hash_timestamp(&mut hasher, trade.timestamp);
        hasher.update(trade.symbol.as_bytes());
        hasher.update(&[match trade.side {
            OrderSide::Buy => 0u8,
            OrderSide::Sell => 1u8,
        }]);
        for value in [trade.price, trade.commission, trade.slippage] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.update(&trade.quantity.to_le_bytes());
    }
    ResultDigest(hasher.finalize().to_hex().to_string())
}

fn hash_timestamp(hasher: &mut blake3::Hasher, ts: NaiveDateTime) {
    let utc = ts.and_utc();
    hasher.update(&utc.timestamp().to_le_bytes());
    hasher.update(&utc.timestamp_subsec_nanos().to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series_from_closes;

    #[test]
    fn dataset_hash_is_deterministic() {
        let a = series_from_closes(&[1.0, 2.0, 3.0]);
        let b = series_from_closes(&[1.0, 2.0, 3.0]);
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        assert_eq!(dataset_hash(&a).0.len(), 64);
    }

    #[test]
    fn dataset_hash_sees_small_changes() {
        let a = series_from_closes(&[1.0, 2.0, 3.0]);
        let b = series_from_closes(&[1.0, 2.0, 3.0000001]);
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn empty_outputs_have_a_stable_digest() {
        assert_eq!(result_digest(&[], &[]), result_digest(&[], &[]));
    }
}
