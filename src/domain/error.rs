//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for rotator.
///
/// Per-day data gaps are not represented here: an asset missing a price or a
/// score is dropped from that day's ranking and recorded in
/// [`DayScores::gaps`](crate::domain::momentum::DayScores). Everything below
/// aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {points} prices, need {minimum}")]
    InsufficientData {
        symbol: String,
        points: usize,
        minimum: usize,
    },

    #[error("no trading days between {start} and {end} after a {window}-day warm-up")]
    EmptyRange {
        start: NaiveDate,
        end: NaiveDate,
        window: usize,
    },

    #[error("ledger already holds {symbol}")]
    DuplicateSymbol { symbol: String },

    #[error("ledger does not hold {symbol}")]
    NotHeld { symbol: String },

    #[error("ledger is full ({capacity} positions), cannot open {symbol}")]
    LedgerFull { symbol: String, capacity: usize },

    #[error("no price for held symbol {symbol} on {date}")]
    MissingPrice { symbol: String, date: NaiveDate },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RotatorError {
    /// True for errors that signal a broken ledger or executor invariant.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            RotatorError::DuplicateSymbol { .. }
                | RotatorError::NotHeld { .. }
                | RotatorError::LedgerFull { .. }
                | RotatorError::MissingPrice { .. }
        )
    }
}

impl From<&RotatorError> for std::process::ExitCode {
    fn from(err: &RotatorError) -> Self {
        let code: u8 = match err {
            RotatorError::Io(_) | RotatorError::Report { .. } => 1,
            RotatorError::ConfigParse { .. }
            | RotatorError::ConfigMissing { .. }
            | RotatorError::ConfigInvalid { .. } => 2,
            RotatorError::Data { .. } => 3,
            RotatorError::DuplicateSymbol { .. }
            | RotatorError::NotHeld { .. }
            | RotatorError::LedgerFull { .. }
            | RotatorError::MissingPrice { .. } => 4,
            RotatorError::NoData { .. }
            | RotatorError::InsufficientData { .. }
            | RotatorError::EmptyRange { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
