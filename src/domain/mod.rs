//! Core domain types and simulation logic.

pub mod series;
pub mod indicator;
pub mod strategy;
pub mod ledger;
pub mod equity;
pub mod metrics;
pub mod backtest;
pub mod sltp;
pub mod optimizer;
pub mod risk;
pub mod whatif;
pub mod error;
