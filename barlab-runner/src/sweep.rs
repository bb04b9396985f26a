//! Parameter sweeps: grid search over strategy parameters, in parallel.
//!
//! Every grid point gets its own strategy, portfolio and broker; runs share
//! only the read-only bar table.

use std::fmt;
use std::str::FromStr;

use barlab_core::config::EngineConfig;
use rayon::prelude::*;
use tracing::info;

use crate::config::StrategySpec;
use crate::data_loader::LoadedData;
use crate::factory::build_strategy;
use crate::metrics::PerformanceMetrics;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamGrid {
    SmaCross {
        shorts: Vec<usize>,
        longs: Vec<usize>,
    },
    Rsi {
        periods: Vec<usize>,
        oversold: Vec<f64>,
        overbought: Vec<f64>,
    },
    Bollinger {
        periods: Vec<usize>,
        widths: Vec<f64>,
    },
}

impl ParamGrid {
    /// Short periods 5, 10, 20; long periods 20, 30, 60.
    pub fn sma_cross_default() -> Self {
        ParamGrid::SmaCross {
            shorts: vec![5, 10, 20],
            longs: vec![20, 30, 60],
        }
    }

    /// All valid strategy specs in the grid. Any combination the strategy
    /// constructor rejects is skipped, so one bad point never fails a sweep.
    pub fn specs(&self) -> Vec<StrategySpec> {
        let mut specs = Vec::new();
        match self {
            ParamGrid::SmaCross { shorts, longs } => {
                for &short in shorts {
                    for &long in longs {
                        specs.push(StrategySpec::SmaCross { short, long });
                    }
                }
            }
            ParamGrid::Rsi {
                periods,
                oversold,
                overbought,
            } => {
                for &period in periods {
                    for &lo in oversold {
                        for &hi in overbought {
                            specs.push(StrategySpec::Rsi {
                                period,
                                oversold: lo,
                                overbought: hi,
                            });
                        }
                    }
                }
            }
            ParamGrid::Bollinger { periods, widths } => {
                for &period in periods {
                    for &width in widths {
                        specs.push(StrategySpec::Bollinger { period, width });
                    }
                }
            }
        }
        specs.retain(|spec| build_strategy(spec).is_ok());
        specs
    }

    pub fn size(&self) -> usize {
        self.specs().len()
    }
}

/// Metric used to rank sweep results. Higher is better, except drawdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMetric {
    TotalReturn,
    Sharpe,
    Sortino,
    Calmar,
    MaxDrawdown,
}

impl RankingMetric {
    /// Sort key where larger is always better.
    fn score(&self, m: &PerformanceMetrics) -> f64 {
        match self {
            RankingMetric::TotalReturn => m.total_return,
            RankingMetric::Sharpe => m.sharpe,
            RankingMetric::Sortino => m.sortino,
            RankingMetric::Calmar => m.calmar,
            RankingMetric::MaxDrawdown => -m.max_drawdown,
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RankingMetric::TotalReturn => "total_return",
            RankingMetric::Sharpe => "sharpe",
            RankingMetric::Sortino => "sortino",
            RankingMetric::Calmar => "calmar",
            RankingMetric::MaxDrawdown => "max_drawdown",
        };
        f.write_str(s)
    }
}

impl FromStr for RankingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_return" | "return" => Ok(RankingMetric::TotalReturn),
            "sharpe" => Ok(RankingMetric::Sharpe),
            "sortino" => Ok(RankingMetric::Sortino),
            "calmar" => Ok(RankingMetric::Calmar),
            "max_drawdown" | "drawdown" => Ok(RankingMetric::MaxDrawdown),
            other => Err(format!("unknown ranking metric '{other}'")),
        }
    }
}

/// Run every grid point against `data`. Fails on the first run error.
pub fn run_sweep(
    data: &LoadedData,
    grid: &ParamGrid,
    engine_config: &EngineConfig,
) -> Result<SweepResults, RunError> {
    let specs = grid.specs();
    info!(runs = specs.len(), "sweep started");
    let results = specs
        .par_iter()
        .map(|spec| run_backtest_from_data(data, spec, engine_config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SweepResults { results })
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
}

impl SweepResults {
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results sorted best-first by `metric`. Ties keep grid order.
    pub fn ranked(&self, metric: RankingMetric) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            metric
                .score(&b.metrics)
                .partial_cmp(&metric.score(&a.metrics))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn top_n(&self, metric: RankingMetric, n: usize) -> Vec<&BacktestResult> {
        self.ranked(metric).into_iter().take(n).collect()
    }

    pub fn best(&self, metric: RankingMetric) -> Option<&BacktestResult> {
        self.ranked(metric).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyntheticSpec;
    use crate::data_loader::{load, DataSource};
    use chrono::NaiveDate;

    #[test]
    fn grid_filters_invalid_combinations() {
        let grid = ParamGrid::SmaCross {
            shorts: vec![10, 50, 100],
            longs: vec![50, 100],
        };
        // Valid: (10,50), (10,100), (50,100)
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.specs()[0], StrategySpec::SmaCross { short: 10, long: 50 });

        let rsi = ParamGrid::Rsi {
            periods: vec![7, 14],
            oversold: vec![20.0, 30.0],
            overbought: vec![25.0, 70.0],
        };
        // per period: (20,25), (20,70), (30,70)
        assert_eq!(rsi.size(), 6);
    }

    #[test]
    fn grid_skips_points_the_constructors_reject() {
        let sma = ParamGrid::SmaCross {
            shorts: vec![0, 5],
            longs: vec![20],
        };
        assert_eq!(sma.specs(), vec![StrategySpec::SmaCross { short: 5, long: 20 }]);

        let rsi = ParamGrid::Rsi {
            periods: vec![0, 14],
            oversold: vec![30.0],
            overbought: vec![70.0, 120.0],
        };
        assert_eq!(
            rsi.specs(),
            vec![StrategySpec::Rsi {
                period: 14,
                oversold: 30.0,
                overbought: 70.0
            }]
        );

        let bollinger = ParamGrid::Bollinger {
            periods: vec![1, 20],
            widths: vec![0.0, -1.0, f64::NAN, 2.0],
        };
        assert_eq!(
            bollinger.specs(),
            vec![StrategySpec::Bollinger {
                period: 20,
                width: 2.0
            }]
        );
    }

    #[test]
    fn sweep_with_bad_points_still_runs_the_good_ones() {
        let data = load(
            &DataSource::Synthetic(SyntheticSpec {
                start: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
                bars: 120,
            }),
            "GRID",
        )
        .unwrap();
        let grid = ParamGrid::SmaCross {
            shorts: vec![0, 5],
            longs: vec![20],
        };
        let config = EngineConfig::for_market(barlab_core::config::Market::Us).with_symbol("GRID");
        let results = run_sweep(&data, &grid, &config).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn ranking_metric_parses() {
        assert_eq!("sharpe".parse::<RankingMetric>().unwrap(), RankingMetric::Sharpe);
        assert_eq!(
            RankingMetric::MaxDrawdown.to_string().parse::<RankingMetric>().unwrap(),
            RankingMetric::MaxDrawdown
        );
        assert!("alpha".parse::<RankingMetric>().is_err());
    }

    #[test]
    fn parallel_sweep_matches_sequential_runs() {
        let data = load(
            &DataSource::Synthetic(SyntheticSpec {
                start: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
                bars: 300,
            }),
            "SWEEP",
        )
        .unwrap();
        let config = EngineConfig::default().with_symbol("SWEEP");
        let grid = ParamGrid::sma_cross_default();
        let results = run_sweep(&data, &grid, &config).unwrap();
        assert_eq!(results.len(), grid.size());

        for (spec, result) in grid.specs().iter().zip(results.all()) {
            let single = run_backtest_from_data(&data, spec, &config).unwrap();
            assert_eq!(&single, result);
        }

        let ranked = results.ranked(RankingMetric::TotalReturn);
        for pair in ranked.windows(2) {
            assert!(pair[0].metrics.total_return >= pair[1].metrics.total_return);
        }
        assert_eq!(results.top_n(RankingMetric::Sharpe, 2).len(), 2);
        assert!(results.best(RankingMetric::Calmar).is_some());
    }
}
