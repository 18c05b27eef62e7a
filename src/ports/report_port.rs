//! Report generation port trait.

use crate::domain::error::RotatorError;
use crate::domain::performance::BacktestReport;
use std::path::Path;

/// Port for persisting a finished backtest.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_dir: &Path) -> Result<(), RotatorError>;
}
