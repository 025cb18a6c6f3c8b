//! Property tests for numeric invariants of the engine.

mod common;

use common::{date, make_series};
use marketlab::domain::backtest::run_backtest;
use marketlab::domain::equity::build_equity_curve;
use marketlab::domain::metrics::{Drawdown, Metrics};
use marketlab::domain::sltp::simulate_trade_sequence;
use marketlab::domain::strategy::{Position, Strategy};
use proptest::prelude::*;

fn positive_closes() -> impl proptest::strategy::Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0_f64..10_000.0, 2..120)
}

proptest! {
    #[test]
    fn max_drawdown_always_within_bounds(closes in positive_closes()) {
        let series = make_series(date(2024, 1, 1), &closes);
        let result = run_backtest("T", &series, &Strategy::BuyAndHold, 10_000.0).unwrap();
        prop_assert!(result.max_drawdown_pct <= 0.0);
        prop_assert!(result.max_drawdown_pct >= -100.0);
    }

    #[test]
    fn equity_curve_length_matches_series(closes in positive_closes()) {
        let series = make_series(date(2024, 1, 1), &closes);
        let signal = vec![Position::Long; series.len()];
        let (curve, _) = build_equity_curve(&series, &signal, "T", 10_000.0).unwrap();
        prop_assert_eq!(curve.len(), series.len());
    }

    #[test]
    fn sharpe_is_always_finite(closes in positive_closes()) {
        let series = make_series(date(2024, 1, 1), &closes);
        let signal = vec![Position::Long; series.len()];
        let (curve, _) = build_equity_curve(&series, &signal, "T", 10_000.0).unwrap();
        let metrics = Metrics::compute(&curve);
        prop_assert!(metrics.sharpe_ratio.is_finite());
        prop_assert!(metrics.annual_volatility_pct.is_finite());
    }

    #[test]
    fn drawdown_is_zero_at_running_maximum(closes in positive_closes()) {
        let series = make_series(date(2024, 1, 1), &closes);
        let signal = vec![Position::Long; series.len()];
        let (curve, _) = build_equity_curve(&series, &signal, "T", 10_000.0).unwrap();
        let dd = Drawdown::scan(&curve);
        // The point reaching the overall peak can never be the trough.
        if let (Some(trough), Some(peak)) = (dd.trough_date, dd.peak_date) {
            prop_assert_ne!(trough, peak);
        }
    }

    #[test]
    fn trade_sequence_win_rate_in_unit_interval(
        closes in positive_closes(),
        sl in 1.0_f64..30.0,
        tp in 1.0_f64..30.0,
    ) {
        let series = make_series(date(2024, 1, 1), &closes);
        let stats = simulate_trade_sequence("T", &series, sl, tp, 1).unwrap();
        prop_assert!(stats.win_rate >= 0.0 && stats.win_rate <= 1.0);
        prop_assert_eq!(
            stats.total_trades,
            stats.trades.len()
        );
        prop_assert!(stats.winning_trades + stats.losing_trades <= stats.total_trades);
    }
}
