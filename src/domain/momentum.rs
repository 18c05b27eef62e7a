//! Momentum signal: rate of change over a fixed lookback window.
//!
//! ROC(n)[i] = (P[i] / P[i-n] - 1) * 100
//!
//! The first n rows have no score. A missing current price, a missing prior
//! price or a prior price of zero also yield no score; the asset is excluded
//! from that day's ranking instead of being scored as zero.

use chrono::NaiveDate;
use tracing::trace;

use super::price_table::PriceTable;

/// Why an asset was excluded from a day's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapReason {
    NoCurrentPrice,
    NoPriorPrice,
    NonPositivePriorPrice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGap {
    pub symbol: String,
    pub reason: GapReason,
}

/// The scored universe for one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayScores {
    pub date: NaiveDate,
    /// Scored assets in universe order.
    pub scores: Vec<(String, f64)>,
    /// Assets dropped from today's ranking.
    pub gaps: Vec<DataGap>,
}

impl DayScores {
    pub fn score(&self, symbol: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|&(_, score)| score)
    }
}

fn roc(current: Option<f64>, prior: Option<f64>) -> Result<f64, GapReason> {
    let current = current.ok_or(GapReason::NoCurrentPrice)?;
    let prior = prior.ok_or(GapReason::NoPriorPrice)?;
    if prior <= 0.0 {
        return Err(GapReason::NonPositivePriorPrice);
    }
    Ok((current / prior - 1.0) * 100.0)
}

/// Score every symbol in the table on row `index`.
///
/// Rows before `window` produce no scores at all; every symbol is reported as
/// lacking a prior price. `index` must be a row of `table`.
pub fn score_day(table: &PriceTable, index: usize, window: usize) -> DayScores {
    let date = table.dates()[index];
    let mut scores = Vec::with_capacity(table.symbols().len());
    let mut gaps = Vec::new();

    for symbol in table.symbols() {
        let current = table.price(index, symbol);
        let prior = index
            .checked_sub(window)
            .and_then(|prior_index| table.price(prior_index, symbol));

        match roc(current, prior) {
            Ok(score) => scores.push((symbol.clone(), score)),
            Err(reason) => {
                trace!(%date, %symbol, ?reason, "excluded from ranking");
                gaps.push(DataGap {
                    symbol: symbol.clone(),
                    reason,
                });
            }
        }
    }

    DayScores { date, scores, gaps }
}
