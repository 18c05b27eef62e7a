//! Performance reporting: summary figures and the benchmark comparison.
//!
//! The benchmark is aligned to the portfolio calendar by date. Each snapshot
//! date takes the last benchmark close on or before it, so holidays that differ
//! between the two calendars never shift values by position.

use chrono::NaiveDate;
use serde::Serialize;

use super::backtest::BacktestResult;
use super::metrics::Metrics;
use super::position::TradeRecord;
use super::price_table::PriceSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub final_value: f64,
    pub total_profit: f64,
    pub benchmark_return_pct: f64,
}

/// A portfolio snapshot joined with the rebased benchmark value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub cash: f64,
    pub total_value: f64,
    pub benchmark_value: Option<f64>,
}

/// Everything the report port needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub benchmark: String,
    pub summary: Summary,
    pub history: Vec<HistoryRow>,
    pub trades: Vec<TradeRecord>,
    pub metrics: Metrics,
}

/// Benchmark close for each of `dates`, forward-filled by date.
pub fn align_benchmark(dates: &[NaiveDate], benchmark: &PriceSeries) -> Vec<Option<f64>> {
    dates
        .iter()
        .map(|&date| benchmark.price_on_or_before(date))
        .collect()
}

/// Rebase aligned prices so the first defined value equals `initial_capital`.
pub fn rebase(aligned: &[Option<f64>], initial_capital: f64) -> Vec<Option<f64>> {
    let base = aligned.iter().flatten().copied().next();
    match base {
        Some(base) if base > 0.0 => aligned
            .iter()
            .map(|p| p.map(|price| price / base * initial_capital))
            .collect(),
        _ => vec![None; aligned.len()],
    }
}

/// (last / first - 1) * 100 over the defined part of `aligned`; 0 when the
/// benchmark never overlaps the portfolio calendar.
pub fn benchmark_return_pct(aligned: &[Option<f64>]) -> f64 {
    let mut defined = aligned.iter().flatten().copied();
    let Some(first) = defined.next() else {
        return 0.0;
    };
    let last = defined.last().unwrap_or(first);
    if first <= 0.0 {
        return 0.0;
    }
    (last / first - 1.0) * 100.0
}

impl Summary {
    pub fn compute(result: &BacktestResult, aligned_benchmark: &[Option<f64>]) -> Self {
        Summary {
            final_value: result.final_capital,
            total_profit: result.total_profit(),
            benchmark_return_pct: benchmark_return_pct(aligned_benchmark),
        }
    }
}

pub fn build_report(
    result: &BacktestResult,
    benchmark: &PriceSeries,
    risk_free_rate: f64,
) -> BacktestReport {
    let dates: Vec<NaiveDate> = result.snapshots.iter().map(|s| s.date).collect();
    let aligned = align_benchmark(&dates, benchmark);
    let rebased = rebase(&aligned, result.initial_capital);

    let history = result
        .snapshots
        .iter()
        .zip(rebased)
        .map(|(snap, benchmark_value)| HistoryRow {
            date: snap.date,
            cash: snap.cash,
            total_value: snap.total_value,
            benchmark_value,
        })
        .collect();

    BacktestReport {
        benchmark: benchmark.symbol.clone(),
        summary: Summary::compute(result, &aligned),
        history,
        trades: result.trades.clone(),
        metrics: Metrics::compute(result, risk_free_rate),
    }
}
