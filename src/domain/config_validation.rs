//! Configuration validation.
//!
//! Every field is checked before any data is loaded, so a bad config fails
//! fast with the offending section and key.

use crate::domain::error::RotatorError;
use crate::domain::strategy::{
    DEFAULT_ALLOCATION_FRACTION, DEFAULT_ELIGIBLE_COUNT, DEFAULT_LOOKBACK_WINDOW,
    DEFAULT_SELECTED_COUNT,
};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;
pub const DEFAULT_BENCHMARK: &str = "SPY";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_rotation_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_symbols(config)?;
    validate_benchmark(config)?;
    validate_counts(config)?;
    validate_allocation_fraction(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RotatorError {
    RotatorError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// Read a `[backtest]` date in `%Y-%m-%d` form.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, RotatorError> {
    match config.get_string("backtest", field) {
        None => Err(RotatorError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    match config.get_string("rotation", "symbols") {
        Some(s) if !s.trim().is_empty() => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| invalid("rotation", "symbols", e.to_string())),
        _ => Err(RotatorError::ConfigMissing {
            section: "rotation".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_benchmark(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    match config.get_string("rotation", "benchmark") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            "rotation",
            "benchmark",
            "benchmark must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_counts(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let window = config.get_int(
        "rotation",
        "lookback_window",
        DEFAULT_LOOKBACK_WINDOW as i64,
    );
    if window < 1 {
        return Err(invalid(
            "rotation",
            "lookback_window",
            "lookback_window must be at least 1",
        ));
    }

    let selected = config.get_int("rotation", "selected_count", DEFAULT_SELECTED_COUNT as i64);
    if selected < 1 {
        return Err(invalid(
            "rotation",
            "selected_count",
            "selected_count must be at least 1",
        ));
    }

    let eligible = config.get_int("rotation", "eligible_count", DEFAULT_ELIGIBLE_COUNT as i64);
    if selected > eligible {
        return Err(invalid(
            "rotation",
            "eligible_count",
            "eligible_count must be at least selected_count",
        ));
    }
    Ok(())
}

fn validate_allocation_fraction(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double(
        "rotation",
        "allocation_fraction",
        DEFAULT_ALLOCATION_FRACTION,
    );
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "rotation",
            "allocation_fraction",
            "allocation_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}
