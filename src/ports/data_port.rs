//! Data access port trait.

use crate::domain::error::RotatorError;
use crate::domain::price_table::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Adjusted closes for `symbol` inside `[start_date, end_date]`, sorted by date.
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, RotatorError>;

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError>;

    /// First date, last date and number of prices, or `None` if the symbol
    /// has no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError>;
}
