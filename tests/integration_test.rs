//! Integration tests for the rotation backtest.
//!
//! Tests cover:
//! - Full pipeline with a mock data port and a recording report port
//! - The three-asset example rotation, end to end
//! - Hysteresis: holdings survive inside the eligible band
//! - Partial universe validation (some symbols skipped, others proceed)
//! - Benchmark alignment when calendars differ
//! - Determinism of repeated runs

mod common;

use approx::assert_relative_eq;
use common::*;
use rotator::cli::run_backtest_pipeline;
use rotator::domain::backtest::{run_backtest, BacktestConfig};
use rotator::domain::error::RotatorError;
use rotator::domain::position::TradeAction;
use rotator::domain::universe::{validate_universe, SkipReason};
use std::path::Path;

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn actions_on(
    trades: &[rotator::domain::position::TradeRecord],
    day: chrono::NaiveDate,
) -> Vec<(String, TradeAction)> {
    trades
        .iter()
        .filter(|t| t.date == day)
        .map(|t| (t.symbol.clone(), t.action))
        .collect()
}

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn pipeline_writes_report_through_port() {
        let port = MockDataPort::new()
            .with_prices("A", &generate_prices(40, 50.0, 0.004, 0.0))
            .with_prices("B", &generate_prices(40, 80.0, 0.002, 1.5))
            .with_prices("C", &generate_prices(40, 20.0, -0.001, 3.0))
            .with_prices("SPY", &generate_prices(40, 400.0, 0.001, 0.7));
        let reports = RecordingReportPort::default();

        let report = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(5, 2, 1),
            &sample_config(10_000.0),
            &symbols(&["A", "B", "C"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap();

        let written = reports.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].1, Path::new("out"));
        assert_eq!(written[0].0, report);

        // 40 days of data minus a 5-day warm-up
        assert_eq!(report.history.len(), 35);
        assert_eq!(report.history[0].date, date(2024, 1, 6));
        assert_eq!(report.benchmark, "SPY");
        assert!(report.history.iter().all(|h| h.benchmark_value.is_some()));
        assert_relative_eq!(report.history[0].benchmark_value.unwrap(), 10_000.0);

        let buys = report
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .count();
        let sells = report.trades.iter().filter(|t| t.is_sell()).count();
        assert!(buys > 0);
        assert_eq!(buys, sells);
        assert_relative_eq!(
            report.summary.total_profit,
            report.summary.final_value - 10_000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn pipeline_without_benchmark_data_still_runs() {
        let port = MockDataPort::new()
            .with_prices("A", &[10.0, 11.0, 12.0, 13.0])
            .with_missing("SPY");
        let reports = RecordingReportPort::default();

        let report = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(1, 1, 1),
            &sample_config(1000.0),
            &symbols(&["A"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap();

        assert!(report.history.iter().all(|h| h.benchmark_value.is_none()));
        assert_eq!(report.summary.benchmark_return_pct, 0.0);
    }

    #[test]
    fn pipeline_fails_on_malformed_benchmark() {
        let port = MockDataPort::new()
            .with_prices("A", &[10.0, 11.0, 12.0, 13.0])
            .with_error("SPY", "bad date on line 4");
        let reports = RecordingReportPort::default();

        let err = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(1, 1, 1),
            &sample_config(1000.0),
            &symbols(&["A"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap_err();

        assert!(matches!(err, RotatorError::Data { .. }));
        assert!(reports.written.borrow().is_empty());
    }

    #[test]
    fn pipeline_fails_on_malformed_symbol_data() {
        let port = MockDataPort::new()
            .with_prices("A", &generate_prices(30, 10.0, 0.01, 0.0))
            .with_error("B", "unparseable price on line 7");
        let reports = RecordingReportPort::default();

        let err = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(5, 2, 1),
            &sample_config(1000.0),
            &symbols(&["A", "B"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap_err();

        assert!(matches!(err, RotatorError::Data { .. }));
        assert!(reports.written.borrow().is_empty());
    }

    #[test]
    fn warmup_rows_are_taken_from_inside_the_range() {
        let port = MockDataPort::new()
            .with_prices("A", &generate_prices(30, 10.0, 0.01, 0.0))
            .with_prices("B", &generate_prices(30, 20.0, 0.0, 1.0));
        let reports = RecordingReportPort::default();
        let config = BacktestConfig {
            start_date: date(2024, 1, 20),
            ..sample_config(1000.0)
        };

        let report = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(5, 2, 1),
            &config,
            &symbols(&["A", "B"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap();

        // Jan 20..24 only seed the lookback.
        assert_eq!(report.history[0].date, date(2024, 1, 25));
        assert!(report.trades.iter().all(|t| t.date >= date(2024, 1, 25)));
        assert_eq!(report.history.last().unwrap().date, date(2024, 1, 30));
    }

    #[test]
    fn pipeline_fails_when_no_symbol_has_history() {
        let port = MockDataPort::new().with_prices("A", &[10.0, 11.0]);
        let reports = RecordingReportPort::default();

        let err = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(15, 5, 2),
            &sample_config(1000.0),
            &symbols(&["A", "B"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap_err();

        assert!(matches!(err, RotatorError::InsufficientData { minimum: 16, .. }));
        assert!(reports.written.borrow().is_empty());
    }

    #[test]
    fn pipeline_ignores_history_before_start_date() {
        let port = MockDataPort::new().with_prices("A", &[10.0, 11.0, 12.0, 13.0, 14.0]);
        let reports = RecordingReportPort::default();
        let config = BacktestConfig {
            start_date: date(2024, 2, 1),
            end_date: date(2024, 3, 1),
            ..sample_config(1000.0)
        };

        let err = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(2, 1, 1),
            &config,
            &symbols(&["A"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap_err();
        assert!(matches!(err, RotatorError::InsufficientData { minimum: 3, .. }));
    }
}

mod rotation_scenarios {
    use super::*;

    #[test]
    fn three_asset_example() {
        let table = make_table(vec![
            ("A", vec![9.0, 10.0]),
            ("B", vec![22.0, 20.0]),
            ("C", vec![27.0, 30.0]),
        ]);
        let result = run_backtest(&table, &make_strategy(1, 3, 2), &sample_config(1000.0)).unwrap();

        assert_eq!(
            actions_on(&result.trades, date(2024, 1, 2)),
            vec![
                ("A".to_string(), TradeAction::Buy),
                ("C".to_string(), TradeAction::Buy),
                ("A".to_string(), TradeAction::Sell),
                ("C".to_string(), TradeAction::Sell),
            ]
        );
        assert_eq!(result.trades[0].shares, 50);
        assert_eq!(result.trades[1].shares, 8);
        assert_eq!(result.snapshots.len(), 1);
        assert_relative_eq!(result.snapshots[0].cash, 260.0, epsilon = 1e-9);
        assert_relative_eq!(result.final_capital, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn holding_survives_inside_eligible_band() {
        // N=2, K=1. A is bought on day 2, slips to second place on day 3 and
        // is kept, then falls to third on day 4 and is rotated into C.
        let table = make_table(vec![
            ("A", vec![10.0, 12.0, 12.6, 11.34]),
            ("B", vec![10.0, 11.0, 13.2, 13.86]),
            ("C", vec![10.0, 10.5, 10.5, 11.55]),
        ]);
        let result = run_backtest(&table, &make_strategy(1, 2, 1), &sample_config(1000.0)).unwrap();

        assert_eq!(
            actions_on(&result.trades, date(2024, 1, 2)),
            vec![("A".to_string(), TradeAction::Buy)]
        );
        assert!(actions_on(&result.trades, date(2024, 1, 3)).is_empty());
        assert_eq!(
            actions_on(&result.trades, date(2024, 1, 4)),
            vec![
                ("A".to_string(), TradeAction::Sell),
                ("C".to_string(), TradeAction::Buy),
                ("C".to_string(), TradeAction::Sell),
            ]
        );

        let a_sell = &result.trades[1];
        assert_eq!(a_sell.shares, 41);
        assert_relative_eq!(a_sell.profit.unwrap(), 41.0 * (11.34 - 12.0), epsilon = 1e-9);

        // 508 cash left after A, plus 41 * 11.34 proceeds, half of it into C
        let c_buy = &result.trades[2];
        assert_eq!(c_buy.shares, ((508.0 + 41.0 * 11.34) * 0.5 / 11.55_f64).floor() as u64);
    }

    #[test]
    fn unaffordable_candidate_leaves_slot_empty() {
        let table = make_table(vec![("A", vec![100.0, 300.0]), ("B", vec![10.0, 11.0])]);
        let result = run_backtest(&table, &make_strategy(1, 2, 1), &sample_config(500.0)).unwrap();

        assert!(result.trades.is_empty());
        assert_relative_eq!(result.final_capital, 500.0);
    }

    #[test]
    fn assets_without_history_are_not_ranked() {
        // D only starts trading on day 3, so it cannot be scored until day 4.
        let mut series = vec![
            PriceSeries::new("A", make_points("2024-01-01", &[10.0, 10.1, 10.2, 10.3])),
            PriceSeries::new("D", make_points("2024-01-03", &[5.0, 10.0])),
        ];
        series.reverse();
        let table = PriceTable::from_series(series).unwrap();
        let result = run_backtest(&table, &make_strategy(1, 1, 1), &sample_config(1000.0)).unwrap();

        assert_eq!(result.trades[0].symbol, "A");
        assert_eq!(result.trades[0].date, date(2024, 1, 2));
        assert_eq!(
            actions_on(&result.trades, date(2024, 1, 4)),
            vec![
                ("A".to_string(), TradeAction::Sell),
                ("D".to_string(), TradeAction::Buy),
                ("D".to_string(), TradeAction::Sell),
            ]
        );
    }
}

mod universe_validation {
    use super::*;

    #[test]
    fn partial_universe_proceeds() {
        let port = MockDataPort::new()
            .with_prices("A", &generate_prices(30, 10.0, 0.01, 0.0))
            .with_prices("B", &[1.0, 2.0])
            .with_prices("C", &generate_prices(30, 20.0, 0.0, 1.0))
            .with_missing("D");

        let result = validate_universe(
            &port,
            symbols(&["A", "B", "C", "D", "E"]),
            "SPY",
            chrono::NaiveDate::MIN,
            date(2024, 12, 31),
            16,
        )
        .unwrap();

        assert_eq!(result.universe.symbols, vec!["A", "C"]);
        let reasons: Vec<_> = result
            .skipped
            .iter()
            .map(|s| (s.symbol.as_str(), s.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("B", SkipReason::InsufficientHistory { points: 2 }),
                ("D", SkipReason::NoData),
                ("E", SkipReason::NoData),
            ]
        );
    }

    #[test]
    fn history_after_end_date_does_not_count() {
        let port = MockDataPort::new().with_prices("A", &generate_prices(30, 10.0, 0.01, 0.0));
        let err = validate_universe(
            &port,
            symbols(&["A"]),
            "SPY",
            chrono::NaiveDate::MIN,
            date(2024, 1, 5),
            16,
        )
        .unwrap_err();
        assert!(matches!(err, RotatorError::InsufficientData { .. }));
    }
}

mod benchmark_alignment {
    use super::*;

    #[test]
    fn benchmark_holidays_forward_fill_by_date() {
        let mut spy = make_points("2024-01-01", &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        // Benchmark closed on Jan 4; the universe traded.
        spy.remove(3);
        let port = MockDataPort::new()
            .with_prices("A", &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0])
            .with_points("SPY", spy);
        let reports = RecordingReportPort::default();

        let report = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(1, 1, 1),
            &sample_config(1000.0),
            &symbols(&["A"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap();

        let values: Vec<f64> = report
            .history
            .iter()
            .map(|h| h.benchmark_value.unwrap())
            .collect();
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[0], 1000.0);
        assert_relative_eq!(values[1], 1000.0 * 102.0 / 101.0, epsilon = 1e-9);
        // Jan 4 carries Jan 3's close
        assert_relative_eq!(values[2], values[1]);
        assert_relative_eq!(values[3], 1000.0 * 104.0 / 101.0, epsilon = 1e-9);
        assert_relative_eq!(
            report.summary.benchmark_return_pct,
            (105.0 / 101.0 - 1.0) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn benchmark_starting_late_leaves_leading_gaps() {
        let port = MockDataPort::new()
            .with_prices("A", &[10.0, 11.0, 12.0, 13.0])
            .with_points("SPY", make_points("2024-01-03", &[200.0, 210.0]));
        let reports = RecordingReportPort::default();

        let report = run_backtest_pipeline(
            &port,
            &reports,
            &make_strategy(1, 1, 1),
            &sample_config(1000.0),
            &symbols(&["A"]),
            "SPY",
            Path::new("out"),
        )
        .unwrap();

        let values: Vec<Option<f64>> = report.history.iter().map(|h| h.benchmark_value).collect();
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(1000.0));
        assert_relative_eq!(values[2].unwrap(), 1050.0, epsilon = 1e-9);
        assert_relative_eq!(report.summary.benchmark_return_pct, 5.0, epsilon = 1e-9);
    }
}

mod determinism {
    use super::*;

    #[test]
    fn repeated_runs_are_identical() {
        let table = make_table(vec![
            ("A", generate_prices(60, 50.0, 0.003, 0.0)),
            ("B", generate_prices(60, 30.0, 0.002, 2.0)),
            ("C", generate_prices(60, 90.0, 0.001, 4.0)),
            ("D", generate_prices(60, 15.0, 0.004, 1.0)),
        ]);
        let strategy = make_strategy(5, 3, 2);
        let config = sample_config(100_000.0);

        let first = run_backtest(&table, &strategy, &config).unwrap();
        let second = run_backtest(&table, &strategy, &config).unwrap();
        assert_eq!(first, second);
        assert!(!first.trades.is_empty());
    }
}
