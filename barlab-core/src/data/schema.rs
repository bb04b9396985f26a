//! Column contract for bar tables.

/// Value columns every bar table must carry, read as `f64`.
pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Accepted names for the time index, in lookup order.
pub const TIME_COLUMNS: [&str; 3] = ["timestamp", "datetime", "date"];

/// Datetime formats accepted for string time columns.
pub const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Date-only formats accepted for string time columns (midnight is assumed).
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
