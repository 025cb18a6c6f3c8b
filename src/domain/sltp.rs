//! Stop-loss / take-profit exit simulation.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::MarketlabError;
use super::series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfPeriod,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::EndOfPeriod => "End of Period",
        };
        write!(f, "{label}")
    }
}

/// Outcome of a single simulated position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SltpResult {
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub exit_reason: ExitReason,
    pub holding_days: i64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub entry_cost: f64,
    pub exit_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

/// Simulate one long position against a series of daily closes.
///
/// The scan runs forward in date order and exits on the first close at or
/// beyond either threshold. When a single close crosses both, stop-loss
/// wins. If neither level is reached, the position closes at the last
/// available price with `EndOfPeriod`. Holding days are calendar days, not
/// trading days.
pub fn simulate_exit(
    symbol: &str,
    series: &PriceSeries,
    entry_price: f64,
    quantity: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
) -> Result<SltpResult, MarketlabError> {
    if entry_price <= 0.0 {
        return Err(MarketlabError::invalid_input("entry price must be positive"));
    }
    if quantity <= 0.0 {
        return Err(MarketlabError::invalid_input("quantity must be positive"));
    }
    if stop_loss_pct < 0.0 || take_profit_pct < 0.0 {
        return Err(MarketlabError::invalid_input(
            "stop-loss and take-profit percentages must be non-negative",
        ));
    }
    let Some(first) = series.first() else {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    };

    let stop_loss_price = entry_price * (1.0 - stop_loss_pct / 100.0);
    let take_profit_price = entry_price * (1.0 + take_profit_pct / 100.0);
    let entry_date = first.date;

    let mut exit = *series.last().expect("non-empty series has a last point");
    let mut exit_reason = ExitReason::EndOfPeriod;

    for point in series.points() {
        if point.close <= stop_loss_price {
            exit = *point;
            exit_reason = ExitReason::StopLoss;
            break;
        }
        if point.close >= take_profit_price {
            exit = *point;
            exit_reason = ExitReason::TakeProfit;
            break;
        }
    }

    let entry_cost = entry_price * quantity;
    let exit_value = exit.close * quantity;
    let profit_loss = (exit.close - entry_price) * quantity;

    Ok(SltpResult {
        entry_price,
        entry_date,
        exit_price: exit.close,
        exit_date: exit.date,
        exit_reason,
        holding_days: (exit.date - entry_date).num_days(),
        stop_loss_price,
        take_profit_price,
        entry_cost,
        exit_value,
        profit_loss,
        profit_loss_pct: profit_loss / entry_cost * 100.0,
    })
}

/// One trade within a sequential simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOutcome {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub profit_loss_pct: f64,
}

/// Aggregate of a sequential stop-loss/take-profit simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceStats {
    pub net_profit_pct: f64,
    /// Fraction of trades with positive profit, in `[0, 1]`.
    pub win_rate: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub trades: Vec<TradeOutcome>,
}

/// Run back-to-back all-in trades over non-overlapping sub-windows.
///
/// Each trade enters at a close, exits per [`simulate_exit`] rules, and the
/// next entry happens `cooldown_days` trading days after the exit. Profit
/// compounds through a single cash balance. A cooldown below 1 is clamped
/// to 1 so the scan always advances.
pub fn simulate_trade_sequence(
    symbol: &str,
    series: &PriceSeries,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    cooldown_days: usize,
) -> Result<SequenceStats, MarketlabError> {
    if series.is_empty() {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let cooldown = cooldown_days.max(1);
    let points = series.points();
    let mut trades = Vec::new();
    let mut growth = 1.0_f64;
    let mut i = 0usize;

    // An entry at the final point could never see an exit day, so the
    // scan stops one short of the end.
    while i + 1 < points.len() {
        let entry = points[i];
        let stop_loss_price = entry.close * (1.0 - stop_loss_pct / 100.0);
        let take_profit_price = entry.close * (1.0 + take_profit_pct / 100.0);

        let mut exit_idx = points.len() - 1;
        let mut exit_reason = ExitReason::EndOfPeriod;
        for (j, point) in points.iter().enumerate().skip(i + 1) {
            if point.close <= stop_loss_price {
                exit_idx = j;
                exit_reason = ExitReason::StopLoss;
                break;
            }
            if point.close >= take_profit_price {
                exit_idx = j;
                exit_reason = ExitReason::TakeProfit;
                break;
            }
        }

        let exit = points[exit_idx];
        let ratio = exit.close / entry.close;
        growth *= ratio;
        trades.push(TradeOutcome {
            entry_date: entry.date,
            entry_price: entry.close,
            exit_date: exit.date,
            exit_price: exit.close,
            exit_reason,
            profit_loss_pct: (ratio - 1.0) * 100.0,
        });

        if exit_idx == points.len() - 1 {
            break;
        }
        i = exit_idx + cooldown;
    }

    let total_trades = trades.len();
    let winning_trades = trades.iter().filter(|t| t.profit_loss_pct > 0.0).count();
    let losing_trades = trades.iter().filter(|t| t.profit_loss_pct < 0.0).count();
    let win_rate = if total_trades > 0 {
        winning_trades as f64 / total_trades as f64
    } else {
        0.0
    };

    Ok(SequenceStats {
        net_profit_pct: (growth - 1.0) * 100.0,
        win_rate,
        total_trades,
        winning_trades,
        losing_trades,
        trades,
    })
}
