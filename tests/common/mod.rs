#![allow(dead_code)]

use chrono::NaiveDate;
use rotator::domain::backtest::BacktestConfig;
use rotator::domain::error::RotatorError;
use rotator::domain::performance::BacktestReport;
pub use rotator::domain::price_table::{PricePoint, PriceSeries, PriceTable};
use rotator::domain::strategy::Strategy;
use rotator::ports::data_port::DataPort;
use rotator::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub missing: Vec<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            missing: Vec::new(),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    /// Daily closes starting on 2024-01-01.
    pub fn with_prices(self, symbol: &str, prices: &[f64]) -> Self {
        self.with_points(symbol, make_points("2024-01-01", prices))
    }

    /// Fetching `symbol` fails as a malformed file would.
    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Fetching `symbol` fails as a missing file would.
    pub fn with_missing(mut self, symbol: &str) -> Self {
        self.missing.push(symbol.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, RotatorError> {
        if self.missing.iter().any(|s| s == symbol) {
            return Err(RotatorError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RotatorError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RotatorError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(points) if !points.is_empty() => {
                let min = points.iter().map(|p| p.date).min().unwrap();
                let max = points.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, points.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Keeps every report it is handed instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(BacktestReport, PathBuf)>>,
}

impl ReportPort for RecordingReportPort {
    fn write(&self, report: &BacktestReport, output_dir: &Path) -> Result<(), RotatorError> {
        self.written
            .borrow_mut()
            .push((report.clone(), output_dir.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One close per calendar day from `start`.
pub fn make_points(start: &str, prices: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect()
}

/// Table with one column per `(symbol, closes)`, all starting 2024-01-01.
pub fn make_table(columns: Vec<(&str, Vec<f64>)>) -> PriceTable {
    let series = columns
        .into_iter()
        .map(|(symbol, prices)| PriceSeries::new(symbol, make_points("2024-01-01", &prices)))
        .collect();
    PriceTable::from_series(series).unwrap()
}

pub fn make_strategy(lookback_window: usize, eligible: usize, selected: usize) -> Strategy {
    Strategy {
        name: "Test".into(),
        lookback_window,
        eligible_count: eligible,
        selected_count: selected,
        allocation_fraction: 0.5,
    }
}

pub fn sample_config(initial_capital: f64) -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital,
        risk_free_rate: 0.05,
    }
}

/// Deterministic trending price path: `start * (1 + drift)^i` with a
/// per-symbol wobble so rankings change over time.
pub fn generate_prices(count: usize, start: f64, drift: f64, phase: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            start * (1.0 + drift).powf(t) * (1.0 + 0.05 * (t / 3.0 + phase).sin())
        })
        .collect()
}
