//! Conversion between polars DataFrames and `BarSeries`.

use super::schema::{DATETIME_FORMATS, DATE_FORMATS, REQUIRED_COLUMNS, TIME_COLUMNS};
use super::series::{BarSeries, TableError};
use crate::domain::Bar;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

fn ingest_err(e: PolarsError) -> TableError {
    TableError::Ingest(e.to_string())
}

impl BarSeries {
    /// Build a series from a DataFrame with a time column and OHLCV columns.
    ///
    /// The time column may be Date, Datetime, or String. Rows are sorted by time
    /// before validation; nulls in any required column are rejected.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, TableError> {
        let time_name = TIME_COLUMNS
            .iter()
            .find(|name| df.column(name).is_ok())
            .ok_or(TableError::MissingTimeIndex)?;

        let mut values: Vec<Vec<f64>> = Vec::with_capacity(REQUIRED_COLUMNS.len());
        for name in REQUIRED_COLUMNS {
            let column = df
                .column(name)
                .map_err(|_| TableError::MissingColumn(name.to_string()))?;
            values.push(float_values(column, name)?);
        }

        let time_column = df.column(time_name).map_err(ingest_err)?;
        let timestamps = timestamp_values(time_column, time_name)?;

        let bars = timestamps
            .into_iter()
            .enumerate()
            .map(|(i, timestamp)| Bar {
                timestamp,
                open: values[0][i],
                high: values[1][i],
                low: values[2][i],
                close: values[3][i],
                volume: values[4][i],
            })
            .collect();

        Self::from_unsorted(bars)
    }

    /// Columns: timestamp (Datetime ms), open, high, low, close, volume.
    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let bars = self.bars();
        let millis: Vec<i64> = bars
            .iter()
            .map(|b| b.timestamp.and_utc().timestamp_millis())
            .collect();
        let field = |f: fn(&Bar) -> f64| -> Vec<f64> { bars.iter().map(f).collect() };

        DataFrame::new(vec![
            Column::new("timestamp".into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(ingest_err)?,
            Column::new("open".into(), field(|b| b.open)),
            Column::new("high".into(), field(|b| b.high)),
            Column::new("low".into(), field(|b| b.low)),
            Column::new("close".into(), field(|b| b.close)),
            Column::new("volume".into(), field(|b| b.volume)),
        ])
        .map_err(ingest_err)
    }
}

fn float_values(column: &Column, name: &str) -> Result<Vec<f64>, TableError> {
    let cast = column.cast(&DataType::Float64).map_err(ingest_err)?;
    let ca = cast.f64().map_err(ingest_err)?;
    (0..ca.len())
        .map(|row| {
            ca.get(row).ok_or_else(|| TableError::NullValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

fn timestamp_values(column: &Column, name: &str) -> Result<Vec<NaiveDateTime>, TableError> {
    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .and_then(|c| c.cast(&DataType::Int64))
                .map_err(ingest_err)?;
            let ca = millis.i64().map_err(ingest_err)?;
            (0..ca.len())
                .map(|row| {
                    let ms = ca.get(row).ok_or_else(|| TableError::NullValue {
                        column: name.to_string(),
                        row,
                    })?;
                    DateTime::from_timestamp_millis(ms)
                        .map(|dt| dt.naive_utc())
                        .ok_or_else(|| TableError::UnparseableTimestamp {
                            value: ms.to_string(),
                        })
                })
                .collect()
        }
        DataType::String => {
            let ca = column.str().map_err(ingest_err)?;
            (0..ca.len())
                .map(|row| {
                    let raw = ca.get(row).ok_or_else(|| TableError::NullValue {
                        column: name.to_string(),
                        row,
                    })?;
                    parse_timestamp(raw)
                })
                .collect()
        }
        other => Err(TableError::UnsupportedTimeType {
            column: name.to_string(),
            dtype: other.to_string(),
        }),
    }
}

/// Parse a datetime or date string. Dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TableError> {
    let trimmed = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            if let Some(ts) = date.and_hms_opt(0, 0, 0) {
                return Ok(ts);
            }
        }
    }
    Err(TableError::UnparseableTimestamp {
        value: raw.to_string(),
    })
}
