//! Brute-force stop-loss/take-profit grid optimization.

use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::error::MarketlabError;
use super::series::PriceSeries;
use super::sltp::simulate_trade_sequence;

/// Hard ceiling on grid size regardless of configuration.
pub const DEFAULT_MAX_COMBINATIONS: usize = 1024;

/// Finite, ordered candidate sets for the two exit thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    stop_loss_pcts: Vec<f64>,
    take_profit_pcts: Vec<f64>,
}

impl GridSpec {
    /// Candidates are sorted ascending and deduplicated so iteration order
    /// is a property of the grid, not of how it was written down.
    pub fn new(
        mut stop_loss_pcts: Vec<f64>,
        mut take_profit_pcts: Vec<f64>,
    ) -> Result<Self, MarketlabError> {
        if stop_loss_pcts.is_empty() || take_profit_pcts.is_empty() {
            return Err(MarketlabError::invalid_input(
                "grid candidate sets must be non-empty",
            ));
        }
        if stop_loss_pcts
            .iter()
            .chain(take_profit_pcts.iter())
            .any(|&pct| pct <= 0.0 || !pct.is_finite())
        {
            return Err(MarketlabError::invalid_input(
                "grid percentages must be positive and finite",
            ));
        }
        stop_loss_pcts.sort_by(f64::total_cmp);
        stop_loss_pcts.dedup();
        take_profit_pcts.sort_by(f64::total_cmp);
        take_profit_pcts.dedup();
        Ok(GridSpec {
            stop_loss_pcts,
            take_profit_pcts,
        })
    }

    pub fn combinations(&self) -> usize {
        self.stop_loss_pcts.len() * self.take_profit_pcts.len()
    }

    /// All `(sl, tp)` pairs, ascending by stop-loss then take-profit.
    fn pairs(&self) -> Vec<(f64, f64)> {
        let mut pairs = Vec::with_capacity(self.combinations());
        for &sl in &self.stop_loss_pcts {
            for &tp in &self.take_profit_pcts {
                pairs.push((sl, tp));
            }
        }
        pairs
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        // Default candidate ranges, a 4x5 grid.
        GridSpec {
            stop_loss_pcts: vec![2.0, 5.0, 10.0, 15.0],
            take_profit_pcts: vec![5.0, 10.0, 15.0, 20.0, 30.0],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizerOptions {
    pub max_combinations: usize,
    pub budget: Option<Duration>,
    pub cooldown_days: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerOptions {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            budget: None,
            cooldown_days: 1,
        }
    }
}

/// Aggregate outcome of one `(sl, tp)` combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboStats {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub net_profit_pct: f64,
    pub win_rate: f64,
    pub total_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub best_sl_pct: f64,
    pub best_tp_pct: f64,
    pub best_net_profit_pct: f64,
    pub best_win_rate: f64,
    /// Ascending by stop-loss then take-profit, independent of how the
    /// combinations were evaluated.
    pub all_results: Vec<ComboStats>,
}

impl OptimizationResult {
    /// Top `n` combinations by net profit, for display truncation.
    pub fn top_by_profit(&self, n: usize) -> Vec<ComboStats> {
        let mut ranked = self.all_results.clone();
        ranked.sort_by(|a, b| {
            b.net_profit_pct
                .total_cmp(&a.net_profit_pct)
                .then(b.win_rate.total_cmp(&a.win_rate))
                .then(a.stop_loss_pct.total_cmp(&b.stop_loss_pct))
                .then(a.take_profit_pct.total_cmp(&b.take_profit_pct))
        });
        ranked.truncate(n);
        ranked
    }
}

/// Exhaustively evaluate every grid combination against the series.
///
/// Combination evaluations are pure functions of `(series, sl, tp)` and run
/// on the rayon pool; results are re-sorted afterwards so `all_results` is
/// deterministic. The best pair maximizes net profit, with ties broken by
/// higher win rate and then by the lower (more conservative) stop-loss.
pub fn optimize(
    symbol: &str,
    series: &PriceSeries,
    grid: &GridSpec,
    options: &OptimizerOptions,
) -> Result<OptimizationResult, MarketlabError> {
    if series.is_empty() {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let combinations = grid.combinations();
    if combinations > options.max_combinations {
        return Err(MarketlabError::GridTooLarge {
            combinations,
            maximum: options.max_combinations,
        });
    }

    let started = Instant::now();
    log::info!("optimizing {symbol}: {combinations} combinations");

    let mut all_results: Vec<ComboStats> = grid
        .pairs()
        .par_iter()
        .map(|&(sl, tp)| {
            if let Some(budget) = options.budget {
                if started.elapsed() > budget {
                    return Err(MarketlabError::Timeout {
                        budget_secs: budget.as_secs(),
                    });
                }
            }
            let stats =
                simulate_trade_sequence(symbol, series, sl, tp, options.cooldown_days)?;
            Ok(ComboStats {
                stop_loss_pct: sl,
                take_profit_pct: tp,
                net_profit_pct: stats.net_profit_pct,
                win_rate: stats.win_rate,
                total_trades: stats.total_trades,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    all_results.sort_by(|a, b| {
        a.stop_loss_pct
            .total_cmp(&b.stop_loss_pct)
            .then(a.take_profit_pct.total_cmp(&b.take_profit_pct))
    });

    let best = all_results
        .iter()
        .reduce(|best, candidate| {
            let ordering = candidate
                .net_profit_pct
                .total_cmp(&best.net_profit_pct)
                .then(candidate.win_rate.total_cmp(&best.win_rate))
                .then(best.stop_loss_pct.total_cmp(&candidate.stop_loss_pct));
            if ordering == std::cmp::Ordering::Greater {
                candidate
            } else {
                best
            }
        })
        .expect("non-empty grid produces at least one result")
        .clone();

    Ok(OptimizationResult {
        best_sl_pct: best.stop_loss_pct,
        best_tp_pct: best.take_profit_pct,
        best_net_profit_pct: best.net_profit_pct,
        best_win_rate: best.win_rate,
        all_results,
    })
}
