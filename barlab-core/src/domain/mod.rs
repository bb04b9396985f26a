//! Domain types: bars, orders, trades, the portfolio ledger, and equity snapshots.

pub mod bar;
pub mod ids;
pub mod order;
pub mod portfolio;
pub mod rejection;
pub mod snapshot;
pub mod trade;

pub use bar::Bar;
pub use ids::{DatasetHash, IdGen, OrderId, ResultDigest};
pub use order::{Order, OrderSide, OrderStateError, OrderStatus, OrderType};
pub use portfolio::Portfolio;
pub use rejection::Rejection;
pub use snapshot::EquitySnapshot;
pub use trade::Trade;
