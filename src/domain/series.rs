//! Historical price series representation.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::MarketlabError;

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// An ordered sequence of price points, strictly increasing by date.
///
/// Non-trading days are simply absent; no uniform spacing is assumed.
/// Construction validates the ordering and that every close is a positive
/// finite number, so downstream scans never have to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, MarketlabError> {
        for point in &points {
            if point.close <= 0.0 || !point.close.is_finite() {
                return Err(MarketlabError::invalid_input(format!(
                    "invalid close {} on {}",
                    point.close, point.date
                )));
            }
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(MarketlabError::invalid_input(format!(
                    "price series not strictly increasing by date: {} then {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(PriceSeries { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Sub-series covering `[start, end]` inclusive. The result keeps the
    /// ordering invariant by construction.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        PriceSeries { points }
    }
}

#[cfg(test)]
pub(crate) fn make_series(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect();
    PriceSeries::new(points).unwrap()
}
