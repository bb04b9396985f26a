//! Typed reasons an order or fill was not executed.
//!
//! Rejections are ordinary outcomes of a run, not errors: they never halt
//! the engine, they only leave the order without a fill.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Rejection {
    #[error("insufficient cash: required {required:.2}, available {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("insufficient position: requested {requested}, held {held}")]
    InsufficientPosition { requested: u64, held: u64 },

    /// Limit buy below the bar's low, or limit sell above its high.
    #[error("limit {limit} not reached (bar bound {bound})")]
    LimitNotReached { limit: f64, bound: f64 },

    #[error("order quantity is zero")]
    ZeroQuantity,

    #[error("invalid fill price {0}")]
    InvalidPrice(f64),
}
