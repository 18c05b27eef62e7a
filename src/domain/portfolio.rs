//! Simulation state and daily valuation.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::ledger::Ledger;
use super::position::TradeRecord;

/// End-of-day portfolio value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub total_value: f64,
}

/// Everything that changes from one trading day to the next.
///
/// The backtest threads this by value through each day's step; the trade log
/// and snapshot series only ever grow.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub initial_capital: f64,
    pub ledger: Ledger,
    pub trades: Vec<TradeRecord>,
    pub snapshots: Vec<PortfolioSnapshot>,
}

impl SimulationState {
    pub fn new(initial_capital: f64, max_positions: usize) -> Self {
        SimulationState {
            cash: initial_capital,
            initial_capital,
            ledger: Ledger::new(max_positions),
            trades: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    /// cash + mark-to-market of every open position.
    pub fn total_value(&self, price_map: &HashMap<String, f64>) -> f64 {
        self.cash + self.ledger.market_value(price_map)
    }

    pub fn snapshot(&self, date: NaiveDate, price_map: &HashMap<String, f64>) -> PortfolioSnapshot {
        PortfolioSnapshot {
            date,
            cash: self.cash,
            total_value: self.total_value(price_map),
        }
    }

    pub fn record_snapshot(&mut self, date: NaiveDate, price_map: &HashMap<String, f64>) {
        let snapshot = self.snapshot(date, price_map);
        self.snapshots.push(snapshot);
    }

    /// Sum of the profit booked on every sell so far.
    pub fn realized_profit(&self) -> f64 {
        self.trades.iter().filter_map(|t| t.profit).sum()
    }
}
