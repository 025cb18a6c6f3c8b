//! Strategy evaluators: price series in, daily position signal out.

use serde::Serialize;

use super::error::MarketlabError;
use super::indicator::sma;
use super::series::PriceSeries;

/// Daily position state produced by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Position {
    Long,
    Flat,
}

/// Closed set of strategies, each bound to its evaluation at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Long from the first available price point onward.
    BuyAndHold,
    /// Long while the short SMA is above the long SMA.
    SmaCrossover {
        short_window: usize,
        long_window: usize,
    },
}

impl Strategy {
    pub fn sma_crossover(
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, MarketlabError> {
        if short_window == 0 {
            return Err(MarketlabError::invalid_input(
                "short window must be at least 1",
            ));
        }
        if short_window >= long_window {
            return Err(MarketlabError::invalid_input(format!(
                "short window {short_window} must be below long window {long_window}"
            )));
        }
        Ok(Strategy::SmaCrossover {
            short_window,
            long_window,
        })
    }

    pub fn name(&self) -> String {
        match self {
            Strategy::BuyAndHold => "Buy and Hold".to_string(),
            Strategy::SmaCrossover {
                short_window,
                long_window,
            } => format!("SMA Crossover ({short_window}/{long_window})"),
        }
    }

    /// Evaluate the strategy over a series, producing one position per date.
    pub fn evaluate(
        &self,
        symbol: &str,
        series: &PriceSeries,
    ) -> Result<Vec<Position>, MarketlabError> {
        match self {
            Strategy::BuyAndHold => Ok(vec![Position::Long; series.len()]),
            Strategy::SmaCrossover {
                short_window,
                long_window,
            } => evaluate_sma_crossover(symbol, series, *short_window, *long_window),
        }
    }
}

fn evaluate_sma_crossover(
    symbol: &str,
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<Vec<Position>, MarketlabError> {
    if series.len() < long_window {
        return Err(MarketlabError::InsufficientData {
            symbol: symbol.to_string(),
            points: series.len(),
            minimum: long_window,
        });
    }

    let closes = series.closes();
    let short_sma = sma(&closes, short_window);
    let long_sma = sma(&closes, long_window);

    let mut signal = Vec::with_capacity(series.len());
    let mut state = Position::Flat;

    for i in 0..series.len() {
        if let (Some(short), Some(long)) = (short_sma[i], long_sma[i]) {
            // Exact ties hold the prior state so the signal cannot
            // oscillate on equal averages.
            if short > long {
                state = Position::Long;
            } else if short < long {
                state = Position::Flat;
            }
        }
        signal.push(state);
    }

    Ok(signal)
}
