//! Bar tables: validation, DataFrame conversion, and file ingest.

pub mod frame;
pub mod ingest;
pub mod schema;
pub mod series;

pub use frame::parse_timestamp;
pub use ingest::{load_bars, load_csv, load_parquet, write_bars};
pub use series::{BarSeries, TableError};
