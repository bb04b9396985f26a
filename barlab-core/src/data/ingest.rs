//! File ingest: CSV and Parquet bar tables through polars.

use super::series::{BarSeries, TableError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn ingest_err(e: PolarsError) -> TableError {
    TableError::Ingest(e.to_string())
}

/// Load a CSV with a header row. Date-like strings are parsed by polars where it can,
/// and by `parse_timestamp` otherwise.
pub fn load_csv(path: &Path) -> Result<BarSeries, TableError> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(ingest_err)?;
    BarSeries::from_dataframe(&df)
}

pub fn load_parquet(path: &Path) -> Result<BarSeries, TableError> {
    let df = LazyFrame::scan_parquet(path, Default::default())
        .and_then(|lf| lf.collect())
        .map_err(ingest_err)?;
    BarSeries::from_dataframe(&df)
}

/// Load by extension: `.csv`, `.parquet`, or `.pq`.
pub fn load_bars(path: &Path) -> Result<BarSeries, TableError> {
    match extension(path).as_deref() {
        Some("csv") => load_csv(path),
        Some("parquet") | Some("pq") => load_parquet(path),
        _ => Err(TableError::Ingest(format!(
            "unsupported file type: {} (expected .csv or .parquet)",
            path.display()
        ))),
    }
}

/// Write by extension: `.csv`, `.parquet`, or `.pq`.
pub fn write_bars(series: &BarSeries, path: &Path) -> Result<(), TableError> {
    let mut df = series.to_dataframe()?;
    let ext = extension(path);
    if !matches!(ext.as_deref(), Some("csv" | "parquet" | "pq")) {
        return Err(TableError::Ingest(format!(
            "unsupported file type: {}",
            path.display()
        )));
    }
    let mut file = File::create(path).map_err(|e| TableError::Ingest(e.to_string()))?;
    match ext.as_deref() {
        Some("csv") => CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(ingest_err),
        _ => ParquetWriter::new(file)
            .finish(&mut df)
            .map(|_| ())
            .map_err(ingest_err),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
