//! Equity curve builder: price series + position signal -> daily values.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::MarketlabError;
use super::ledger::TradeRecord;
use super::series::PriceSeries;
use super::strategy::Position;

/// Daily mark-to-market portfolio value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Walk the series in date order, executing the signal with all available
/// cash and marking the portfolio to market at each close.
///
/// FLAT->LONG invests all cash at that day's close (fractional shares);
/// LONG->FLAT liquidates in full. A signal that ends long is valued at the
/// final close without a forced sale, so the trade log only reflects
/// executed trades. The curve always has one point per series date.
pub fn build_equity_curve(
    series: &PriceSeries,
    signal: &[Position],
    symbol: &str,
    initial_cash: f64,
) -> Result<(Vec<EquityPoint>, Vec<TradeRecord>), MarketlabError> {
    if signal.len() != series.len() {
        return Err(MarketlabError::invalid_input(format!(
            "signal length {} does not match series length {}",
            signal.len(),
            series.len()
        )));
    }
    if initial_cash <= 0.0 {
        return Err(MarketlabError::invalid_input(
            "initial cash must be positive",
        ));
    }

    let mut cash = initial_cash;
    let mut shares = 0.0_f64;
    let mut state = Position::Flat;
    let mut curve = Vec::with_capacity(series.len());
    let mut trades = Vec::new();

    for (point, &target) in series.points().iter().zip(signal) {
        match (state, target) {
            (Position::Flat, Position::Long) => {
                shares = cash / point.close;
                trades.push(TradeRecord::buy(symbol, shares, point.close, point.date));
                cash = 0.0;
                state = Position::Long;
            }
            (Position::Long, Position::Flat) => {
                cash = shares * point.close;
                trades.push(TradeRecord::sell(symbol, shares, point.close, point.date));
                shares = 0.0;
                state = Position::Flat;
            }
            _ => {}
        }

        curve.push(EquityPoint {
            date: point.date,
            value: cash + shares * point.close,
        });
    }

    Ok((curve, trades))
}
