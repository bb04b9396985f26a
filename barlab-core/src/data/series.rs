//! BarSeries: a validated, time-ascending bar table.

use crate::domain::Bar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("no time column: expected one of timestamp, datetime, date")]
    MissingTimeIndex,

    #[error("column '{column}' has a null value at row {row}")]
    NullValue { column: String, row: usize },

    #[error("row {row}: non-finite value in '{column}'")]
    NonFinite { row: usize, column: &'static str },

    #[error("timestamps not ascending at row {row}: {previous} then {current}")]
    NonMonotonic {
        row: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("duplicate timestamp {timestamp} at row {row}")]
    DuplicateTimestamp { row: usize, timestamp: NaiveDateTime },

    #[error("time column '{column}' has unsupported type {dtype}")]
    UnsupportedTimeType { column: String, dtype: String },

    #[error("cannot parse '{value}' as a timestamp")]
    UnparseableTimestamp { value: String },

    #[error("ingest failed: {0}")]
    Ingest(String),
}

/// Ordered bar table handed to strategies and the engine.
///
/// Construction guarantees strictly ascending, unique timestamps and finite OHLCV
/// values. An empty table is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, TableError> {
        for (row, bar) in bars.iter().enumerate() {
            check_finite(row, bar)?;
            if row > 0 {
                let previous = bars[row - 1].timestamp;
                if bar.timestamp == previous {
                    return Err(TableError::DuplicateTimestamp {
                        row,
                        timestamp: bar.timestamp,
                    });
                }
                if bar.timestamp < previous {
                    return Err(TableError::NonMonotonic {
                        row,
                        previous,
                        current: bar.timestamp,
                    });
                }
            }
        }
        Ok(Self { bars })
    }

    /// Sort by timestamp, then validate. Duplicates are still an error.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, TableError> {
        bars.sort_by_key(|b| b.timestamp);
        Self::new(bars)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars whose timestamps fall in `[start, end]`.
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> BarSeries {
        BarSeries {
            bars: self
                .bars
                .iter()
                .filter(|b| b.timestamp >= start && b.timestamp <= end)
                .cloned()
                .collect(),
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

fn check_finite(row: usize, bar: &Bar) -> Result<(), TableError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
        ("volume", bar.volume),
    ];
    for (column, value) in fields {
        if !value.is_finite() {
            return Err(TableError::NonFinite { row, column });
        }
    }
    Ok(())
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = TableError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<BarSeries> for Vec<Bar> {
    fn from(series: BarSeries) -> Self {
        series.bars
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
