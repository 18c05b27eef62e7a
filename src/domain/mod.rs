//! Core domain types and logic.

pub mod error;
pub mod price_table;
pub mod momentum;
pub mod rotation;
pub mod position;
pub mod ledger;
pub mod portfolio;
pub mod execution;
pub mod strategy;
pub mod backtest;
pub mod performance;
pub mod metrics;
pub mod universe;
pub mod config_validation;
