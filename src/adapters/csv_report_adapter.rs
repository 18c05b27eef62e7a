//! CSV report adapter: `trade_log.csv`, `portfolio_history.csv` and
//! `summary.csv` in one output directory.
//!
//! Money columns are rounded to cents here and nowhere else.

use crate::domain::error::RotatorError;
use crate::domain::performance::BacktestReport;
use crate::domain::position::TradeAction;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const TRADE_LOG_FILE: &str = "trade_log.csv";
pub const HISTORY_FILE: &str = "portfolio_history.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Serialize)]
struct TradeRow<'a> {
    date: NaiveDate,
    symbol: &'a str,
    action: TradeAction,
    price: f64,
    shares: u64,
    profit: Option<f64>,
}

#[derive(Serialize)]
struct HistoryCsvRow {
    date: NaiveDate,
    cash: f64,
    total_value: f64,
    benchmark_value: Option<f64>,
}

#[derive(Serialize)]
struct SummaryRow {
    metric: &'static str,
    value: f64,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Header first, so a file with no rows still names its columns.
    fn write_rows<T: Serialize>(
        path: &Path,
        header: &[&str],
        rows: impl IntoIterator<Item = T>,
    ) -> Result<(), RotatorError> {
        let report_err = |e: csv::Error| RotatorError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(report_err)?;
        writer.write_record(header).map_err(report_err)?;
        for row in rows {
            writer.serialize(row).map_err(report_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BacktestReport, output_dir: &Path) -> Result<(), RotatorError> {
        fs::create_dir_all(output_dir).map_err(|e| RotatorError::Report {
            reason: format!("cannot create {}: {}", output_dir.display(), e),
        })?;

        Self::write_rows(
            &output_dir.join(TRADE_LOG_FILE),
            &["date", "symbol", "action", "price", "shares", "profit"],
            report.trades.iter().map(|t| TradeRow {
                date: t.date,
                symbol: &t.symbol,
                action: t.action,
                price: round2(t.price),
                shares: t.shares,
                profit: t.profit.map(round2),
            }),
        )?;

        Self::write_rows(
            &output_dir.join(HISTORY_FILE),
            &["date", "cash", "total_value", "benchmark_value"],
            report.history.iter().map(|h| HistoryCsvRow {
                date: h.date,
                cash: round2(h.cash),
                total_value: round2(h.total_value),
                benchmark_value: h.benchmark_value.map(round2),
            }),
        )?;

        let summary = &report.summary;
        Self::write_rows(
            &output_dir.join(SUMMARY_FILE),
            &["metric", "value"],
            [
                SummaryRow {
                    metric: "final_value",
                    value: round2(summary.final_value),
                },
                SummaryRow {
                    metric: "total_profit",
                    value: round2(summary.total_profit),
                },
                SummaryRow {
                    metric: "benchmark_return_pct",
                    value: round2(summary.benchmark_return_pct),
                },
            ],
        )?;

        info!(
            dir = %output_dir.display(),
            trades = report.trades.len(),
            days = report.history.len(),
            "report written"
        );
        Ok(())
    }
}
