//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row. The
//! `date` column must be `%Y-%m-%d`; the price column is the adjusted close
//! when present and the plain close otherwise.

use crate::domain::error::RotatorError;
use crate::domain::price_table::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const PRICE_COLUMNS: [&str; 4] = ["adj_close", "adj close", "adjclose", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PricePoint>, RotatorError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(RotatorError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| RotatorError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let headers = rdr.headers().map_err(|e| RotatorError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let (date_col, price_col) = locate_columns(headers).ok_or_else(|| RotatorError::Data {
            reason: format!(
                "{} needs a date column and one of {}",
                path.display(),
                PRICE_COLUMNS.join("/")
            ),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| RotatorError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                RotatorError::Data {
                    reason: format!("invalid date '{}' in {}: {}", date_str, path.display(), e),
                }
            })?;

            let price_str = record.get(price_col).unwrap_or("").trim();
            if price_str.is_empty() {
                continue;
            }
            let close: f64 = price_str.parse().map_err(|e| RotatorError::Data {
                reason: format!(
                    "invalid price '{}' for {} on {}: {}",
                    price_str, symbol, date, e
                ),
            })?;

            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

/// Index of the date column and the preferred price column.
fn locate_columns(headers: &StringRecord) -> Option<(usize, usize)> {
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let date = names.iter().position(|n| n == "date")?;
    let price = PRICE_COLUMNS
        .iter()
        .find_map(|wanted| names.iter().position(|n| n == wanted))?;
    Some((date, price))
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, RotatorError> {
        let mut points = self.read_all(symbol)?;
        points.retain(|p| p.date >= start_date && p.date <= end_date);
        Ok(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RotatorError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RotatorError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError> {
        let points = match self.read_all(symbol) {
            Ok(points) => points,
            Err(RotatorError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}
