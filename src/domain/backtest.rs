//! Backtest runner: strategy -> signal -> equity curve -> metrics.

use serde::Serialize;

use super::equity::{build_equity_curve, EquityPoint};
use super::error::MarketlabError;
use super::ledger::TradeRecord;
use super::metrics::Metrics;
use super::series::PriceSeries;
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annual_volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
}

/// Run a single-symbol backtest over an immutable price snapshot.
pub fn run_backtest(
    symbol: &str,
    series: &PriceSeries,
    strategy: &Strategy,
    initial_cash: f64,
) -> Result<BacktestResult, MarketlabError> {
    if series.is_empty() {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let signal = strategy.evaluate(symbol, series)?;
    let (equity_curve, trades) = build_equity_curve(series, &signal, symbol, initial_cash)?;
    let metrics = Metrics::compute(&equity_curve);

    let final_value = equity_curve
        .last()
        .map(|p| p.value)
        .unwrap_or(initial_cash);

    log::info!(
        "backtest {} on {symbol}: {} trades, return {:.2}%",
        strategy.name(),
        trades.len(),
        metrics.total_return_pct
    );

    Ok(BacktestResult {
        strategy_name: strategy.name(),
        symbol: symbol.to_string(),
        initial_value: initial_cash,
        final_value,
        total_return_pct: metrics.total_return_pct,
        annual_volatility_pct: metrics.annual_volatility_pct,
        sharpe_ratio: metrics.sharpe_ratio,
        max_drawdown_pct: metrics.max_drawdown_pct,
        num_trades: trades.len(),
        equity_curve,
        trades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::make_series;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn empty_series_is_no_data() {
        let series = make_series(start(), &[]);
        let err = run_backtest("RXRX", &series, &Strategy::BuyAndHold, 10_000.0).unwrap_err();
        assert!(matches!(err, MarketlabError::NoData { .. }));
    }

    #[test]
    fn buy_and_hold_return_matches_price_change() {
        let series = make_series(start(), &[50.0, 55.0, 60.0]);
        let result = run_backtest("RXRX", &series, &Strategy::BuyAndHold, 10_000.0).unwrap();

        // (60/50 - 1) * 100
        assert!((result.total_return_pct - 20.0).abs() < 1e-9);
        assert!((result.final_value - 12_000.0).abs() < 1e-9);
        assert_eq!(result.num_trades, 1);
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(result.strategy_name, "Buy and Hold");
    }

    #[test]
    fn buy_and_hold_constant_prices() {
        let series = make_series(start(), &[75.0; 10]);
        let result = run_backtest("RXRX", &series, &Strategy::BuyAndHold, 10_000.0).unwrap();
        assert!((result.total_return_pct - 0.0).abs() < 1e-9);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.max_drawdown_pct, 0.0);
    }

    #[test]
    fn sma_crossover_constant_prices_never_trades() {
        let series = make_series(start(), &[75.0; 30]);
        let strategy = Strategy::sma_crossover(3, 10).unwrap();
        let result = run_backtest("RXRX", &series, &strategy, 10_000.0).unwrap();
        assert_eq!(result.num_trades, 0);
        assert!((result.final_value - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn sma_crossover_trades_on_trend_change() {
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64 * 5.0).collect();
        closes.extend((0..15).map(|i| 170.0 - i as f64 * 8.0));
        let series = make_series(start(), &closes);
        let strategy = Strategy::sma_crossover(3, 8).unwrap();
        let result = run_backtest("RXRX", &series, &strategy, 10_000.0).unwrap();

        // Long during the rise, flat after the fall crosses back down.
        assert!(result.num_trades >= 2);
        assert_eq!(result.equity_curve.len(), series.len());
    }

    #[test]
    fn insufficient_data_propagates() {
        let series = make_series(start(), &[100.0; 5]);
        let strategy = Strategy::sma_crossover(2, 10).unwrap();
        let err = run_backtest("RXRX", &series, &strategy, 10_000.0).unwrap_err();
        assert!(matches!(err, MarketlabError::InsufficientData { .. }));
    }
}
