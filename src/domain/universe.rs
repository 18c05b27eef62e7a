//! Symbol universe: parsing the configured list and checking each symbol has
//! enough price history to be scored.

use crate::domain::error::RotatorError;
use crate::domain::price_table::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    /// Symbols in configured order; this order breaks ranking ties.
    pub symbols: Vec<String>,
    pub benchmark: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated symbol list, trimming and upper-casing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientHistory { points: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Symbols that passed validation, with the series already loaded for them.
#[derive(Debug, Clone)]
pub struct UniverseValidationResult {
    pub universe: Universe,
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Load every symbol and drop the ones that can never be scored.
///
/// A symbol is skipped when the data port has nothing for it (`NoData` or an
/// empty series), or when it has fewer than `min_history` prices. Any other
/// port error aborts validation. The run fails if no symbol survives.
pub fn validate_universe(
    data_port: &dyn DataPort,
    symbols: Vec<String>,
    benchmark: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_history: usize,
) -> Result<UniverseValidationResult, RotatorError> {
    let mut valid = Vec::new();
    let mut series = Vec::new();
    let mut skipped = Vec::new();
    let total = symbols.len();

    for symbol in symbols {
        let points = match data_port.fetch_closes(&symbol, start_date, end_date) {
            Ok(points) => points,
            Err(RotatorError::NoData { .. }) => {
                warn!(%symbol, "skipping symbol: no data file");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: SkipReason::NoData,
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        if points.is_empty() {
            warn!(%symbol, "skipping symbol: no data found");
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if points.len() < min_history {
            warn!(
                %symbol,
                points = points.len(),
                minimum = min_history,
                "skipping symbol: insufficient history"
            );
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::InsufficientHistory {
                    points: points.len(),
                },
            });
            continue;
        }

        debug!(%symbol, points = points.len(), "symbol ok");
        series.push(PriceSeries::new(symbol.clone(), points));
        valid.push(symbol);
    }

    if valid.is_empty() {
        return Err(RotatorError::InsufficientData {
            symbol: "all".to_string(),
            points: 0,
            minimum: min_history,
        });
    }

    if !skipped.is_empty() {
        info!(valid = valid.len(), total, "backtesting a reduced universe");
    }

    Ok(UniverseValidationResult {
        universe: Universe {
            symbols: valid,
            benchmark: benchmark.to_string(),
        },
        series,
        skipped,
    })
}
