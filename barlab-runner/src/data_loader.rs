//! Bar loading for the runner.
//!
//! Two sources:
//! 1. A CSV or Parquet file, read and validated by `barlab_core::data`
//! 2. Synthetic bars: a deterministic random walk seeded from the symbol
//!
//! Synthetic data is a developer mode. Results produced on it are tagged.

use std::path::{Path, PathBuf};

use barlab_core::data::{self, BarSeries, TableError};
use barlab_core::domain::{Bar, DatasetHash};
use barlab_core::fingerprint::dataset_hash;
use chrono::{Datelike, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{RunConfig, SyntheticSpec};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load {path}: {source}")]
    Table {
        path: PathBuf,
        source: TableError,
    },

    #[error("synthetic data generation failed: {0}")]
    Synthetic(TableError),
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Synthetic(SyntheticSpec),
}

impl DataSource {
    /// The source a run config asks for. `None` if it names neither.
    pub fn from_config(config: &RunConfig) -> Option<Self> {
        match (&config.backtest.data, &config.backtest.synthetic) {
            (Some(path), _) => Some(DataSource::File(path.clone())),
            (None, Some(spec)) => Some(DataSource::Synthetic(spec.clone())),
            (None, None) => None,
        }
    }
}

/// Loaded bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: BarSeries,
    pub dataset_hash: DatasetHash,
    pub has_synthetic: bool,
}

pub fn load(source: &DataSource, symbol: &str) -> Result<LoadedData, LoadError> {
    let (bars, has_synthetic) = match source {
        DataSource::File(path) => (load_file(path)?, false),
        DataSource::Synthetic(spec) => {
            warn!(%symbol, bars = spec.bars, "using synthetic data; results will be tagged");
            let bars = generate_synthetic_bars(symbol, spec.start, spec.bars);
            (BarSeries::new(bars).map_err(LoadError::Synthetic)?, true)
        }
    };
    info!(%symbol, bars = bars.len(), synthetic = has_synthetic, "bars loaded");
    Ok(LoadedData {
        dataset_hash: dataset_hash(&bars),
        bars,
        has_synthetic,
    })
}

fn load_file(path: &Path) -> Result<BarSeries, LoadError> {
    data::load_bars(path).map_err(|source| LoadError::Table {
        path: path.to_path_buf(),
        source,
    })
}

/// Generate `count` weekday bars starting at `start` (or the next weekday).
///
/// A random walk from 100.0 with daily returns in ±3%. Same symbol, same bars.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut current = start;

    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar {
            timestamp: current.and_time(NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
