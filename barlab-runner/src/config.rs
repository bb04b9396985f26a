//! Serializable run configuration, read from TOML.
//!
//! ```toml
//! [backtest]
//! symbol = "600000"
//! market = "a_share"
//! initial_capital = 100000.0
//! data = "data/600000.csv"
//!
//! [costs]
//! slippage = 0.002
//!
//! [strategy]
//! type = "sma_cross"
//! short = 5
//! long = 20
//! ```

use std::path::{Path, PathBuf};

use barlab_core::config::{EngineConfig, Market};
use barlab_core::execution::{CostModel, FeeModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[backtest] needs either `data` or `synthetic`, not both")]
    AmbiguousData,

    #[error("[backtest] needs a data source: set `data` or `synthetic`")]
    MissingData,

    #[error("engine config: {0}")]
    Engine(#[from] barlab_core::ConfigError),
}

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub costs: CostOverrides,
    pub strategy: StrategySpec,
}

/// The `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    #[serde(default = "default_market")]
    pub market: Market,
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    /// Path to a CSV or Parquet bar file.
    #[serde(default)]
    pub data: Option<PathBuf>,
    /// Generate deterministic synthetic bars instead of reading a file.
    #[serde(default)]
    pub synthetic: Option<SyntheticSpec>,
    /// Overrides the market's board lot.
    #[serde(default)]
    pub lot_size: Option<u64>,
    /// Overrides the default-buy cash fraction.
    #[serde(default)]
    pub cash_fraction: Option<f64>,
}

/// Synthetic data request: `bars` weekdays starting at `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub start: NaiveDate,
    pub bars: usize,
}

/// Optional `[costs]` overrides applied on top of the market preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostOverrides {
    pub fee_model: Option<FeeModel>,
    pub commission_rate: Option<f64>,
    pub min_commission: Option<f64>,
    pub sell_tax_rate: Option<f64>,
    pub slippage: Option<f64>,
    /// Turns off price and fee rounding.
    #[serde(default)]
    pub no_rounding: bool,
}

/// Strategy selection (serializable enum, tagged by `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    SmaCross {
        #[serde(default = "default_short")]
        short: usize,
        #[serde(default = "default_long")]
        long: usize,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: f64,
        #[serde(default = "default_overbought")]
        overbought: f64,
    },
    Bollinger {
        #[serde(default = "default_bollinger_period")]
        period: usize,
        #[serde(default = "default_width")]
        width: f64,
    },
}

fn default_market() -> Market {
    Market::AShare
}
fn default_capital() -> f64 {
    barlab_core::config::DEFAULT_INITIAL_CAPITAL
}
fn default_short() -> usize {
    5
}
fn default_long() -> usize {
    20
}
fn default_rsi_period() -> usize {
    14
}
fn default_oversold() -> f64 {
    30.0
}
fn default_overbought() -> f64 {
    70.0
}
fn default_bollinger_period() -> usize {
    20
}
fn default_width() -> f64 {
    2.0
}

impl StrategySpec {
    /// Short identifier used on the command line.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategySpec::SmaCross { .. } => "sma_cross",
            StrategySpec::Rsi { .. } => "rsi",
            StrategySpec::Bollinger { .. } => "bollinger",
        }
    }

    /// Default parameters for a strategy kind.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "sma_cross" | "sma" => Some(StrategySpec::SmaCross {
                short: default_short(),
                long: default_long(),
            }),
            "rsi" => Some(StrategySpec::Rsi {
                period: default_rsi_period(),
                oversold: default_oversold(),
                overbought: default_overbought(),
            }),
            "bollinger" | "bb" => Some(StrategySpec::Bollinger {
                period: default_bollinger_period(),
                width: default_width(),
            }),
            _ => None,
        }
    }
}

impl CostOverrides {
    pub fn apply(&self, mut costs: CostModel) -> CostModel {
        if let Some(fee_model) = self.fee_model {
            costs.fee_model = fee_model;
        }
        if let Some(rate) = self.commission_rate {
            costs.commission_rate = rate;
        }
        if let Some(min) = self.min_commission {
            costs.min_commission = min;
        }
        if let Some(rate) = self.sell_tax_rate {
            costs.sell_tax_rate = rate;
        }
        if let Some(slippage) = self.slippage {
            costs.slippage = slippage;
        }
        if self.no_rounding {
            costs.price_decimals = None;
            costs.fee_decimals = None;
        }
        costs
    }
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Checks the data source and the engine settings this config produces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.backtest.data, &self.backtest.synthetic) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousData),
            (None, None) => return Err(ConfigError::MissingData),
            _ => {}
        }
        self.engine_config().validate()?;
        Ok(())
    }

    /// Engine settings: market preset, then `[backtest]` and `[costs]` overrides.
    pub fn engine_config(&self) -> EngineConfig {
        let b = &self.backtest;
        let preset = EngineConfig::for_market(b.market);
        let costs = self.costs.apply(preset.costs.clone());
        let mut config = preset
            .with_symbol(b.symbol.clone())
            .with_capital(b.initial_capital)
            .with_costs(costs);
        if let Some(lot) = b.lot_size {
            config = config.with_lot_size(lot);
        }
        if let Some(fraction) = b.cash_fraction {
            config = config.with_cash_fraction(fraction);
        }
        config
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs have the same RunId.
    pub fn run_id(&self) -> RunId {
        // Serializing plain data structs to JSON cannot fail; fall back to Debug anyway.
        let canonical = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
symbol = "600000"
market = "a_share"
initial_capital = 50000.0
data = "bars.csv"

[costs]
slippage = 0.002

[strategy]
type = "sma_cross"
short = 10
long = 30
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backtest.symbol, "600000");
        assert_eq!(config.backtest.market, Market::AShare);
        assert_eq!(config.backtest.data, Some(PathBuf::from("bars.csv")));
        assert_eq!(
            config.strategy,
            StrategySpec::SmaCross { short: 10, long: 30 }
        );
        let engine = config.engine_config();
        assert_eq!(engine.initial_capital, 50_000.0);
        assert_eq!(engine.costs.slippage, 0.002);
        assert_eq!(engine.costs.fee_model, FeeModel::FloorAndTax);
        assert_eq!(engine.lot_size, 100);
    }

    #[test]
    fn strategy_params_default() {
        let text = r#"
[backtest]
symbol = "AAPL"
market = "us"
synthetic = { start = "2024-01-01", bars = 100 }

[strategy]
type = "rsi"
"#;
        let config = RunConfig::from_toml(text).unwrap();
        assert_eq!(
            config.strategy,
            StrategySpec::Rsi {
                period: 14,
                oversold: 30.0,
                overbought: 70.0
            }
        );
        assert_eq!(config.engine_config().lot_size, 1);
        assert_eq!(config.backtest.initial_capital, 100_000.0);
    }

    #[test]
    fn rejects_missing_or_double_data_source() {
        let missing = "[backtest]\nsymbol = \"X\"\n[strategy]\ntype = \"bollinger\"\n";
        assert!(matches!(
            RunConfig::from_toml(missing),
            Err(ConfigError::MissingData)
        ));

        let both = r#"
[backtest]
symbol = "X"
data = "a.csv"
synthetic = { start = "2024-01-01", bars = 10 }
[strategy]
type = "bollinger"
"#;
        assert!(matches!(
            RunConfig::from_toml(both),
            Err(ConfigError::AmbiguousData)
        ));
    }

    #[test]
    fn rejects_invalid_engine_settings() {
        let text = SAMPLE.replace("initial_capital = 50000.0", "initial_capital = -1.0");
        assert!(matches!(
            RunConfig::from_toml(&text),
            Err(ConfigError::Engine(_))
        ));
    }

    #[test]
    fn unknown_strategy_type_is_a_parse_error() {
        let text = SAMPLE.replace("type = \"sma_cross\"", "type = \"martingale\"");
        assert!(matches!(RunConfig::from_toml(&text), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn run_id_deterministic_and_param_sensitive() {
        let a = RunConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        b.strategy = StrategySpec::SmaCross { short: 5, long: 30 };
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);
    }

    #[test]
    fn no_rounding_clears_decimals() {
        let overrides = CostOverrides {
            no_rounding: true,
            ..Default::default()
        };
        let costs = overrides.apply(CostModel::floor_and_tax());
        assert_eq!(costs.price_decimals, None);
        assert_eq!(costs.fee_decimals, None);
    }

    #[test]
    fn kind_round_trips() {
        for kind in ["sma_cross", "rsi", "bollinger"] {
            assert_eq!(StrategySpec::from_kind(kind).unwrap().kind(), kind);
        }
        assert!(StrategySpec::from_kind("nope").is_none());
    }
}
