//! What-if scenarios: all-in single-asset simulations and comparisons.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::equity::EquityPoint;
use super::error::MarketlabError;
use super::metrics::Metrics;
use super::series::PriceSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfResult {
    pub symbol: String,
    pub investment_amount: f64,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: f64,
    pub exit_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub holding_days: i64,
    pub annualized_return: f64,
    pub annual_volatility_pct: f64,
    pub peak_value: f64,
    pub peak_date: Option<NaiveDate>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub best_day_return_pct: f64,
    pub best_day_date: Option<NaiveDate>,
    pub worst_day_return_pct: f64,
    pub worst_day_date: Option<NaiveDate>,
    pub timeline: Vec<EquityPoint>,
}

/// Simulate putting the full amount into one symbol at the first close of
/// the window and holding to the last.
///
/// The timeline rebases the price path to `shares * close`; all risk and
/// drawdown figures are computed over that rebased curve.
pub fn all_in_scenario(
    symbol: &str,
    series: &PriceSeries,
    investment_amount: f64,
) -> Result<WhatIfResult, MarketlabError> {
    if symbol.is_empty() {
        return Err(MarketlabError::invalid_input("symbol must be non-empty"));
    }
    if investment_amount <= 0.0 {
        return Err(MarketlabError::invalid_input(
            "investment amount must be positive",
        ));
    }
    let (Some(entry), Some(exit)) = (series.first(), series.last()) else {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    };
    if entry.close <= 0.0 {
        return Err(MarketlabError::invalid_input(format!(
            "non-positive entry price {} for {symbol}",
            entry.close
        )));
    }

    let shares = investment_amount / entry.close;
    let timeline: Vec<EquityPoint> = series
        .points()
        .iter()
        .map(|p| EquityPoint {
            date: p.date,
            value: shares * p.close,
        })
        .collect();

    let metrics = Metrics::compute(&timeline);
    let exit_value = shares * exit.close;
    let profit_loss = exit_value - investment_amount;

    Ok(WhatIfResult {
        symbol: symbol.to_string(),
        investment_amount,
        entry_date: entry.date,
        entry_price: entry.close,
        exit_date: exit.date,
        exit_price: exit.close,
        shares,
        exit_value,
        profit_loss,
        profit_loss_pct: profit_loss / investment_amount * 100.0,
        holding_days: (exit.date - entry.date).num_days(),
        annualized_return: metrics.annualized_return,
        annual_volatility_pct: metrics.annual_volatility_pct,
        peak_value: metrics.peak_value,
        peak_date: metrics.peak_date,
        max_drawdown_pct: metrics.max_drawdown_pct,
        max_drawdown_date: metrics.max_drawdown_date,
        best_day_return_pct: metrics.best_day_return_pct,
        best_day_date: metrics.best_day_date,
        worst_day_return_pct: metrics.worst_day_return_pct,
        worst_day_date: metrics.worst_day_date,
        timeline,
    })
}

/// Per-symbol summary inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub symbol: String,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub exit_value: f64,
    pub max_drawdown_pct: f64,
    pub annual_volatility_pct: f64,
    pub annualized_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performer {
    pub symbol: String,
    pub return_pct: f64,
    pub final_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub investment_amount: f64,
    pub scenarios: Vec<ScenarioSummary>,
    pub best_performer: Performer,
    pub worst_performer: Performer,
    /// Percentage-point gap between best and worst returns.
    pub spread: f64,
}

/// Run the all-in simulation independently per symbol and rank the outcomes.
///
/// Symbols with no usable data are skipped with a warning; the comparison
/// fails only when every scenario failed. There is no cross-symbol
/// interaction: each scenario gets the full amount.
pub fn compare_scenarios(
    candidates: &[(String, PriceSeries)],
    investment_amount: f64,
) -> Result<ScenarioComparison, MarketlabError> {
    let mut scenarios = Vec::with_capacity(candidates.len());

    for (symbol, series) in candidates {
        match all_in_scenario(symbol, series, investment_amount) {
            Ok(result) => scenarios.push(ScenarioSummary {
                symbol: result.symbol,
                profit_loss: result.profit_loss,
                profit_loss_pct: result.profit_loss_pct,
                exit_value: result.exit_value,
                max_drawdown_pct: result.max_drawdown_pct,
                annual_volatility_pct: result.annual_volatility_pct,
                annualized_return: result.annualized_return,
            }),
            Err(err) => log::warn!("skipping {symbol}: {err}"),
        }
    }

    let Some(first) = scenarios.first() else {
        return Err(MarketlabError::invalid_input(
            "no scenario produced a result",
        ));
    };

    let mut best = first;
    let mut worst = first;
    for scenario in &scenarios {
        if scenario.profit_loss_pct > best.profit_loss_pct {
            best = scenario;
        }
        if scenario.profit_loss_pct < worst.profit_loss_pct {
            worst = scenario;
        }
    }

    let best_performer = Performer {
        symbol: best.symbol.clone(),
        return_pct: best.profit_loss_pct,
        final_value: best.exit_value,
    };
    let worst_performer = Performer {
        symbol: worst.symbol.clone(),
        return_pct: worst.profit_loss_pct,
        final_value: worst.exit_value,
    };
    let spread = best_performer.return_pct - worst_performer.return_pct;

    Ok(ScenarioComparison {
        investment_amount,
        scenarios,
        best_performer,
        worst_performer,
        spread,
    })
}

/// One scheduled purchase in a dollar-cost averaging run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcaPurchase {
    pub date: NaiveDate,
    pub price: f64,
    pub shares: f64,
    pub amount: f64,
    pub total_shares: f64,
    pub total_invested: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcaResult {
    pub symbol: String,
    pub monthly_investment: f64,
    pub total_invested: f64,
    pub total_shares: f64,
    pub avg_price: f64,
    pub final_price: f64,
    pub final_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub num_purchases: usize,
    pub purchases: Vec<DcaPurchase>,
}

/// Simulate dollar-cost averaging: a fixed amount buys shares at the first
/// close of each calendar month in the window, and the accumulated position
/// is valued at the last close.
pub fn dollar_cost_average_scenario(
    symbol: &str,
    series: &PriceSeries,
    monthly_investment: f64,
) -> Result<DcaResult, MarketlabError> {
    if symbol.is_empty() {
        return Err(MarketlabError::invalid_input("symbol must be non-empty"));
    }
    if monthly_investment <= 0.0 {
        return Err(MarketlabError::invalid_input(
            "monthly investment must be positive",
        ));
    }
    let Some(exit) = series.last() else {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    };

    let mut purchases = Vec::new();
    let mut total_shares = 0.0_f64;
    let mut total_invested = 0.0_f64;
    let mut current_month: Option<(i32, u32)> = None;

    for point in series.points() {
        let month = (point.date.year(), point.date.month());
        if current_month == Some(month) {
            continue;
        }
        current_month = Some(month);

        let shares = monthly_investment / point.close;
        total_shares += shares;
        total_invested += monthly_investment;
        purchases.push(DcaPurchase {
            date: point.date,
            price: point.close,
            shares,
            amount: monthly_investment,
            total_shares,
            total_invested,
        });
    }

    let final_value = total_shares * exit.close;
    let profit_loss = final_value - total_invested;

    Ok(DcaResult {
        symbol: symbol.to_string(),
        monthly_investment,
        total_invested,
        total_shares,
        avg_price: if total_shares > 0.0 {
            total_invested / total_shares
        } else {
            0.0
        },
        final_price: exit.close,
        final_value,
        profit_loss,
        profit_loss_pct: if total_invested > 0.0 {
            profit_loss / total_invested * 100.0
        } else {
            0.0
        },
        num_purchases: purchases.len(),
        purchases,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DcaWinner {
    LumpSum,
    Dca,
}

impl std::fmt::Display for DcaWinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DcaWinner::LumpSum => "Lump Sum",
            DcaWinner::Dca => "DCA",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LumpSumLeg {
    pub final_value: f64,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcaLeg {
    pub final_value: f64,
    pub return_pct: f64,
    pub num_purchases: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LumpSumVsDca {
    pub symbol: String,
    pub total_amount: f64,
    pub lump_sum: LumpSumLeg,
    pub dca: DcaLeg,
    pub winner: DcaWinner,
    pub difference: f64,
    /// Signed gap `(lump_sum - dca) / total_amount`, as a percentage.
    pub difference_pct: f64,
}

/// Pit a single all-in purchase against the same amount spread over
/// `dca_periods` monthly purchases.
pub fn lump_sum_vs_dca(
    symbol: &str,
    series: &PriceSeries,
    total_amount: f64,
    dca_periods: usize,
) -> Result<LumpSumVsDca, MarketlabError> {
    if dca_periods == 0 {
        return Err(MarketlabError::invalid_input(
            "dca periods must be at least 1",
        ));
    }

    let lump = all_in_scenario(symbol, series, total_amount)?;
    let dca =
        dollar_cost_average_scenario(symbol, series, total_amount / dca_periods as f64)?;

    let winner = if lump.exit_value > dca.final_value {
        DcaWinner::LumpSum
    } else {
        DcaWinner::Dca
    };

    Ok(LumpSumVsDca {
        symbol: symbol.to_string(),
        total_amount,
        lump_sum: LumpSumLeg {
            final_value: lump.exit_value,
            return_pct: lump.profit_loss_pct,
            max_drawdown_pct: lump.max_drawdown_pct,
        },
        dca: DcaLeg {
            final_value: dca.final_value,
            return_pct: dca.profit_loss_pct,
            num_purchases: dca.num_purchases,
        },
        winner,
        difference: (lump.exit_value - dca.final_value).abs(),
        difference_pct: (lump.exit_value - dca.final_value) / total_amount * 100.0,
    })
}
