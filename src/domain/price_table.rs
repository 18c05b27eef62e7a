//! Price series store: adjusted closes on a unified, forward-filled calendar.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;

use super::error::RotatorError;

/// One adjusted closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Raw per-symbol series as delivered by a data port. May contain calendar gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting points by date.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last observation on or before `date`.
    pub fn price_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].close)
    }
}

/// Date → (symbol → price) table.
///
/// The calendar is the union of every series' dates. Each column is
/// forward-filled from the symbol's first observation onwards; before that the
/// price is absent. Symbol order is the order of the input series and is the
/// tie-break order used when ranking.
#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    symbol_index: HashMap<String, usize>,
}

impl PriceTable {
    pub fn from_series(series: Vec<PriceSeries>) -> Result<Self, RotatorError> {
        let mut seen = HashSet::new();
        for s in &series {
            if !seen.insert(s.symbol.as_str()) {
                return Err(RotatorError::Data {
                    reason: format!("duplicate series for {}", s.symbol),
                });
            }
            validate_series(s)?;
        }

        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let date_index: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

        let mut symbols = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            let mut column = vec![None; dates.len()];
            for p in &s.points {
                column[date_index[&p.date]] = Some(p.close);
            }
            forward_fill(&mut column);
            symbols.push(s.symbol);
            columns.push(column);
        }

        let symbol_index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        Ok(Self {
            dates,
            symbols,
            columns,
            symbol_index,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.symbol_index
            .get(symbol)
            .map(|&i| self.columns[i].as_slice())
    }

    pub fn price(&self, index: usize, symbol: &str) -> Option<f64> {
        self.column(symbol)
            .and_then(|column| column.get(index).copied().flatten())
    }

    /// Every defined price on the given row, keyed by symbol.
    pub fn prices_on(&self, index: usize) -> HashMap<String, f64> {
        self.symbols
            .iter()
            .zip(&self.columns)
            .filter_map(|(symbol, column)| {
                column
                    .get(index)
                    .copied()
                    .flatten()
                    .map(|price| (symbol.clone(), price))
            })
            .collect()
    }

    /// Row indices of the trading days inside `[start, end]`. The first
    /// `warmup` rows on or after `start` only seed the lookback.
    pub fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        warmup: usize,
    ) -> Result<Range<usize>, RotatorError> {
        let first = self.dates.partition_point(|&d| d < start) + warmup;
        let last = self.dates.partition_point(|&d| d <= end);
        if first >= last {
            return Err(RotatorError::EmptyRange {
                start,
                end,
                window: warmup,
            });
        }
        Ok(first..last)
    }
}

fn validate_series(series: &PriceSeries) -> Result<(), RotatorError> {
    for pair in series.points.windows(2) {
        if pair[0].date >= pair[1].date {
            return Err(RotatorError::Data {
                reason: format!(
                    "{} has non-increasing dates at {}",
                    series.symbol, pair[1].date
                ),
            });
        }
    }
    if let Some(bad) = series
        .points
        .iter()
        .find(|p| !p.close.is_finite() || p.close < 0.0)
    {
        return Err(RotatorError::Data {
            reason: format!(
                "{} has invalid price {} on {}",
                series.symbol, bad.close, bad.date
            ),
        });
    }
    Ok(())
}

fn forward_fill(column: &mut [Option<f64>]) {
    let mut last = None;
    for slot in column.iter_mut() {
        match slot {
            Some(price) => last = Some(*price),
            None => *slot = last,
        }
    }
}
