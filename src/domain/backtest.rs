//! Backtest driver: the day-by-day rotation loop.
//!
//! Each trading day runs score → select → execute (sells, then buys) →
//! value. The simulation state is passed by value into [`step`] and handed
//! back, so a single day's transition can be tested on its own.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::error::RotatorError;
use super::execution::{self, RotationFills};
use super::momentum::{self, DayScores};
use super::portfolio::{PortfolioSnapshot, SimulationState};
use super::position::TradeRecord;
use super::price_table::PriceTable;
use super::rotation::{self, Rotation};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
}

/// What happened on one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDecision {
    pub scores: DayScores,
    pub rotation: Rotation,
    pub fills: RotationFills,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    /// Cash after end-of-run liquidation.
    pub final_capital: f64,
    pub trades: Vec<TradeRecord>,
    pub snapshots: Vec<PortfolioSnapshot>,
}

impl BacktestResult {
    pub fn total_profit(&self) -> f64 {
        self.final_capital - self.initial_capital
    }
}

/// Advance the simulation by the trading day on row `index`.
pub fn step(
    mut state: SimulationState,
    table: &PriceTable,
    index: usize,
    strategy: &Strategy,
) -> Result<(SimulationState, DayDecision), RotatorError> {
    let scores = momentum::score_day(table, index, strategy.lookback_window);
    let date = scores.date;
    let rotation = rotation::select(
        &scores,
        state.ledger.holdings(),
        strategy.eligible_count,
        strategy.selected_count,
    );

    let price_map = table.prices_on(index);
    let fills = execution::execute_rotation(
        &mut state,
        &rotation,
        &price_map,
        date,
        strategy.allocation_fraction,
    )?;
    state.record_snapshot(date, &price_map);

    debug!(
        %date,
        scored = scores.scores.len(),
        gaps = scores.gaps.len(),
        sold = fills.sold,
        bought = fills.bought,
        cash = state.cash,
        "day complete"
    );

    Ok((
        state,
        DayDecision {
            scores,
            rotation,
            fills,
        },
    ))
}

/// Run the rotation over every trading day of `table` inside the configured
/// range, then liquidate what is still held at the last day's prices.
pub fn run_backtest(
    table: &PriceTable,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, RotatorError> {
    let days = table.trading_days(config.start_date, config.end_date, strategy.lookback_window)?;
    info!(
        days = days.len(),
        symbols = table.symbols().len(),
        strategy = %strategy.name,
        "running backtest"
    );

    let mut state = SimulationState::new(config.initial_capital, strategy.max_positions());
    for index in days.clone() {
        let (next, _) = step(state, table, index, strategy)?;
        state = next;
    }

    let last = days.end - 1;
    let closed = execution::liquidate_all(&mut state, &table.prices_on(last), table.dates()[last])?;
    info!(
        trades = state.trades.len(),
        closed_at_end = closed,
        final_capital = state.cash,
        "backtest complete"
    );

    Ok(BacktestResult {
        initial_capital: state.initial_capital,
        final_capital: state.cash,
        trades: state.trades,
        snapshots: state.snapshots,
    })
}
