//! Performance metrics derived from an equity curve.

use chrono::NaiveDate;
use serde::Serialize;

use super::equity::EquityPoint;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return_pct: f64,
    /// Fractional annualized growth rate, `(final/initial)^(252/days) - 1`.
    pub annualized_return: f64,
    pub annual_volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub peak_value: f64,
    pub peak_date: Option<NaiveDate>,
    pub best_day_return_pct: f64,
    pub best_day_date: Option<NaiveDate>,
    pub worst_day_return_pct: f64,
    pub worst_day_date: Option<NaiveDate>,
}

impl Metrics {
    /// Every ratio degrades to `0` rather than NaN when its denominator
    /// vanishes (flat curve, single point, zero holding days).
    pub fn compute(curve: &[EquityPoint]) -> Self {
        let initial = curve.first().map(|p| p.value).unwrap_or(0.0);
        let final_value = curve.last().map(|p| p.value).unwrap_or(0.0);

        let total_return_pct = if initial > 0.0 {
            (final_value / initial - 1.0) * 100.0
        } else {
            0.0
        };

        let holding_days = match (curve.first(), curve.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        };
        let annualized_return = if holding_days > 0 && initial > 0.0 && final_value > 0.0 {
            (final_value / initial).powf(TRADING_DAYS_PER_YEAR / holding_days as f64) - 1.0
        } else {
            0.0
        };

        let returns = daily_returns(curve);
        let stdev = stdev(&returns);
        let annual_volatility_pct = stdev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        let sharpe_ratio = if stdev > 0.0 {
            mean(&returns) / stdev * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        let drawdown = Drawdown::scan(curve);

        let (best_day_return_pct, best_day_date, worst_day_return_pct, worst_day_date) =
            extreme_days(curve, &returns);

        Metrics {
            total_return_pct,
            annualized_return,
            annual_volatility_pct,
            sharpe_ratio,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            max_drawdown_date: drawdown.trough_date,
            peak_value: drawdown.peak_value,
            peak_date: drawdown.peak_date,
            best_day_return_pct,
            best_day_date,
            worst_day_return_pct,
            worst_day_date,
        }
    }
}

/// Simple percent change between consecutive equity values.
pub fn daily_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|pair| {
            let prev = pair[0].value;
            if prev > 0.0 {
                (pair[1].value - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawdown {
    /// Always in `[-100, 0]`.
    pub max_drawdown_pct: f64,
    pub trough_date: Option<NaiveDate>,
    pub peak_value: f64,
    pub peak_date: Option<NaiveDate>,
}

impl Drawdown {
    /// Running-peak scan: at each point `drawdown = (value - peak) / peak`,
    /// keeping the deepest trough and the highest peak seen so far.
    pub fn scan(curve: &[EquityPoint]) -> Self {
        let Some(first) = curve.first() else {
            return Drawdown {
                max_drawdown_pct: 0.0,
                trough_date: None,
                peak_value: 0.0,
                peak_date: None,
            };
        };

        let mut running_peak = first.value;
        let mut peak_value = first.value;
        let mut peak_date = first.date;
        let mut max_dd = 0.0_f64;
        let mut trough_date = None;

        for point in curve {
            if point.value > running_peak {
                running_peak = point.value;
            }
            if point.value > peak_value {
                peak_value = point.value;
                peak_date = point.date;
            }
            if running_peak > 0.0 {
                let dd = (point.value - running_peak) / running_peak;
                if dd < max_dd {
                    max_dd = dd;
                    trough_date = Some(point.date);
                }
            }
        }

        Drawdown {
            max_drawdown_pct: max_dd * 100.0,
            trough_date,
            peak_value,
            peak_date: Some(peak_date),
        }
    }
}

fn extreme_days(
    curve: &[EquityPoint],
    returns: &[f64],
) -> (f64, Option<NaiveDate>, f64, Option<NaiveDate>) {
    let mut best = f64::NEG_INFINITY;
    let mut worst = f64::INFINITY;
    let mut best_date = None;
    let mut worst_date = None;

    // returns[i] is the change into curve[i + 1].
    for (i, &r) in returns.iter().enumerate() {
        if r > best {
            best = r;
            best_date = Some(curve[i + 1].date);
        }
        if r < worst {
            worst = r;
            worst_date = Some(curve[i + 1].date);
        }
    }

    if returns.is_empty() {
        (0.0, None, 0.0, None)
    } else {
        (best * 100.0, best_date, worst * 100.0, worst_date)
    }
}
