//! Transaction ledger: keyed portfolio store with per-portfolio locking.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use super::error::MarketlabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// An executed trade. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub date: NaiveDate,
    pub total: f64,
}

impl TradeRecord {
    pub fn buy(symbol: &str, quantity: f64, price: f64, date: NaiveDate) -> Self {
        TradeRecord {
            side: TradeSide::Buy,
            symbol: symbol.to_string(),
            quantity,
            price,
            date,
            total: quantity * price,
        }
    }

    pub fn sell(symbol: &str, quantity: f64, price: f64, date: NaiveDate) -> Self {
        TradeRecord {
            side: TradeSide::Sell,
            symbol: symbol.to_string(),
            quantity,
            price,
            date,
            total: quantity * price,
        }
    }
}

/// Mutable state of a single portfolio: cash, holdings and transaction log.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub initial_cash: f64,
    pub cash: f64,
    pub holdings: HashMap<String, f64>,
    pub transactions: Vec<TradeRecord>,
}

impl PortfolioState {
    pub fn new(initial_cash: f64) -> Self {
        PortfolioState {
            initial_cash,
            cash: initial_cash,
            holdings: HashMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Result<(), MarketlabError> {
        let cost = quantity * price;
        if cost > self.cash {
            return Err(MarketlabError::invalid_input(format!(
                "insufficient cash: need {cost:.2}, have {:.2}",
                self.cash
            )));
        }
        self.cash -= cost;
        *self.holdings.entry(symbol.to_string()).or_insert(0.0) += quantity;
        self.transactions
            .push(TradeRecord::buy(symbol, quantity, price, date));
        Ok(())
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Result<(), MarketlabError> {
        let held = self.holdings.get(symbol).copied().unwrap_or(0.0);
        if held < quantity {
            return Err(MarketlabError::invalid_input(format!(
                "insufficient holdings of {symbol}: need {quantity}, have {held}"
            )));
        }
        self.cash += quantity * price;
        let remaining = held - quantity;
        if remaining == 0.0 {
            self.holdings.remove(symbol);
        } else {
            self.holdings.insert(symbol.to_string(), remaining);
        }
        self.transactions
            .push(TradeRecord::sell(symbol, quantity, price, date));
        Ok(())
    }

    /// Cash plus mark-to-market value of all holdings.
    pub fn total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        let holdings_value: f64 = self
            .holdings
            .iter()
            .map(|(symbol, qty)| qty * prices.get(symbol).copied().unwrap_or(0.0))
            .sum();
        self.cash + holdings_value
    }

    pub fn total_return_pct(&self, prices: &HashMap<String, f64>) -> f64 {
        if self.initial_cash <= 0.0 {
            return 0.0;
        }
        (self.total_value(prices) - self.initial_cash) / self.initial_cash * 100.0
    }

    /// Per-position view of current holdings, sorted by symbol.
    ///
    /// The average price is the quantity-weighted mean across buy
    /// transactions; gain is measured against that basis.
    pub fn positions(&self, prices: &HashMap<String, f64>) -> Vec<PositionSummary> {
        let mut summaries: Vec<PositionSummary> = self
            .holdings
            .iter()
            .map(|(symbol, &quantity)| {
                let (bought_qty, bought_cost) = self
                    .transactions
                    .iter()
                    .filter(|t| t.side == TradeSide::Buy && &t.symbol == symbol)
                    .fold((0.0, 0.0), |(qty, cost), t| (qty + t.quantity, cost + t.total));
                let avg_price = if bought_qty > 0.0 {
                    bought_cost / bought_qty
                } else {
                    0.0
                };
                let current_price = prices.get(symbol).copied().unwrap_or(0.0);
                let gain_pct = if avg_price > 0.0 {
                    (current_price - avg_price) / avg_price * 100.0
                } else {
                    0.0
                };
                PositionSummary {
                    symbol: symbol.clone(),
                    quantity,
                    avg_price,
                    current_price,
                    market_value: quantity * current_price,
                    gain_pct,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        summaries
    }
}

/// Snapshot of one held position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub gain_pct: f64,
}

/// Keyed store mapping portfolio identifiers to their state.
///
/// Mutation is serialized per portfolio id only; unrelated portfolios can
/// be traded concurrently.
#[derive(Debug, Default)]
pub struct Ledger {
    portfolios: RwLock<HashMap<String, Arc<Mutex<PortfolioState>>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn open_portfolio(&self, id: &str, initial_cash: f64) -> Arc<Mutex<PortfolioState>> {
        let mut portfolios = self.portfolios.write().expect("ledger lock poisoned");
        portfolios
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PortfolioState::new(initial_cash))))
            .clone()
    }

    pub fn portfolio(&self, id: &str) -> Option<Arc<Mutex<PortfolioState>>> {
        let portfolios = self.portfolios.read().expect("ledger lock poisoned");
        portfolios.get(id).cloned()
    }

    pub fn record(
        &self,
        id: &str,
        trade: &TradeRecord,
    ) -> Result<(), MarketlabError> {
        let handle = self.portfolio(id).ok_or_else(|| {
            MarketlabError::invalid_input(format!("unknown portfolio {id}"))
        })?;
        let mut state = handle.lock().expect("portfolio lock poisoned");
        match trade.side {
            TradeSide::Buy => state.buy(&trade.symbol, trade.quantity, trade.price, trade.date),
            TradeSide::Sell => state.sell(&trade.symbol, trade.quantity, trade.price, trade.date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn buy_reduces_cash_and_adds_holding() {
        let mut state = PortfolioState::new(100_000.0);
        state.buy("RXRX", 100.0, 50.0, date(2)).unwrap();
        assert!((state.cash - 95_000.0).abs() < f64::EPSILON);
        assert!((state.holdings["RXRX"] - 100.0).abs() < f64::EPSILON);
        assert_eq!(state.transactions.len(), 1);
        assert_eq!(state.transactions[0].side, TradeSide::Buy);
        assert!((state.transactions[0].total - 5_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_fails_on_insufficient_cash() {
        let mut state = PortfolioState::new(100.0);
        assert!(state.buy("RXRX", 100.0, 50.0, date(2)).is_err());
        assert!(state.transactions.is_empty());
        assert!((state.cash - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_restores_cash_and_clears_holding() {
        let mut state = PortfolioState::new(10_000.0);
        state.buy("IONQ", 10.0, 100.0, date(2)).unwrap();
        state.sell("IONQ", 10.0, 120.0, date(5)).unwrap();
        assert!((state.cash - 10_200.0).abs() < 1e-9);
        assert!(!state.holdings.contains_key("IONQ"));
        assert_eq!(state.transactions.len(), 2);
    }

    #[test]
    fn sell_fails_on_insufficient_holdings() {
        let mut state = PortfolioState::new(10_000.0);
        state.buy("IONQ", 5.0, 100.0, date(2)).unwrap();
        assert!(state.sell("IONQ", 10.0, 120.0, date(3)).is_err());
        assert_eq!(state.transactions.len(), 1);
    }

    #[test]
    fn partial_sell_keeps_remainder() {
        let mut state = PortfolioState::new(10_000.0);
        state.buy("IONQ", 10.0, 100.0, date(2)).unwrap();
        state.sell("IONQ", 4.0, 110.0, date(3)).unwrap();
        assert!((state.holdings["IONQ"] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn total_value_marks_to_market() {
        let mut state = PortfolioState::new(10_000.0);
        state.buy("RXRX", 100.0, 50.0, date(2)).unwrap();
        let prices = HashMap::from([("RXRX".to_string(), 60.0)]);
        assert!((state.total_value(&prices) - 11_000.0).abs() < 1e-9);
        assert!((state.total_return_pct(&prices) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn positions_report_average_price_gain() {
        let mut state = PortfolioState::new(100_000.0);
        state.buy("RXRX", 100.0, 50.0, date(2)).unwrap();
        state.buy("RXRX", 100.0, 70.0, date(3)).unwrap();
        state.buy("IONQ", 10.0, 100.0, date(4)).unwrap();

        let prices = HashMap::from([
            ("RXRX".to_string(), 90.0),
            ("IONQ".to_string(), 100.0),
        ]);
        let positions = state.positions(&prices);

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].symbol, "IONQ");
        assert_eq!(positions[1].symbol, "RXRX");
        // Basis (100*50 + 100*70) / 200 = 60; price 90 is +50%.
        assert!((positions[1].avg_price - 60.0).abs() < 1e-9);
        assert!((positions[1].gain_pct - 50.0).abs() < 1e-9);
        assert!((positions[1].market_value - 18_000.0).abs() < 1e-9);
        assert!((positions[0].gain_pct - 0.0).abs() < 1e-9);
    }

    #[test]
    fn ledger_serializes_per_portfolio() {
        let ledger = Ledger::new();
        ledger.open_portfolio("alice", 10_000.0);
        ledger.open_portfolio("bob", 20_000.0);

        let trade = TradeRecord::buy("RXRX", 10.0, 50.0, date(2));
        ledger.record("alice", &trade).unwrap();

        let alice = ledger.portfolio("alice").unwrap();
        let bob = ledger.portfolio("bob").unwrap();
        assert_eq!(alice.lock().unwrap().transactions.len(), 1);
        assert!(bob.lock().unwrap().transactions.is_empty());
    }

    #[test]
    fn ledger_rejects_unknown_portfolio() {
        let ledger = Ledger::new();
        let trade = TradeRecord::buy("RXRX", 10.0, 50.0, date(2));
        assert!(ledger.record("nobody", &trade).is_err());
    }

    #[test]
    fn concurrent_trades_on_same_portfolio_are_not_lost() {
        use std::thread;

        let ledger = std::sync::Arc::new(Ledger::new());
        ledger.open_portfolio("shared", 1_000_000.0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let trade = TradeRecord::buy("RXRX", 1.0, 10.0, date(2));
                        ledger.record("shared", &trade).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = ledger.portfolio("shared").unwrap();
        let state = state.lock().unwrap();
        assert_eq!(state.transactions.len(), 400);
        assert!((state.cash - (1_000_000.0 - 4_000.0)).abs() < 1e-6);
    }
}
