use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the equity curve, taken after a bar's events have drained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub market_value: f64,
    pub total_equity: f64,
    pub position: u64,
}
