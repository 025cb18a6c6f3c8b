//! Market data access port trait.

use crate::domain::error::MarketlabError;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Closing prices for `[start_date, end_date]`, ascending by date.
    /// May be empty; callers treat an empty series as `NoData`.
    fn fetch_historical(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlabError>;

    /// Latest available close for the symbol.
    fn fetch_current_price(&self, symbol: &str) -> Result<f64, MarketlabError>;

    fn list_symbols(&self) -> Result<Vec<String>, MarketlabError>;
}
