//! Trade execution: liquidation then acquisition.
//!
//! Fills happen at the day's closing price, in whole shares, with no fees or
//! slippage. Each buy sizes itself from the cash left after the previous one.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

use super::error::RotatorError;
use super::portfolio::SimulationState;
use super::position::{Position, TradeRecord};
use super::rotation::Rotation;

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { shares: u64, price: f64, cost: f64 },
    /// The allocation does not cover a single share.
    InsufficientCapital,
    /// A zero price cannot open a position.
    NonPositivePrice,
}

/// Buy `symbol` with `fraction` of the current cash.
///
/// 1. allocation = cash * fraction
/// 2. shares = floor(allocation / price)
/// 3. If shares == 0, nothing happens
/// 4. Open the position, debit cash, append a Buy record
pub fn enter_position(
    state: &mut SimulationState,
    symbol: &str,
    price: f64,
    date: NaiveDate,
    fraction: f64,
) -> Result<EntryResult, RotatorError> {
    if price <= 0.0 {
        return Ok(EntryResult::NonPositivePrice);
    }

    let allocation = state.cash * fraction;
    let shares = (allocation / price).floor() as u64;
    if shares == 0 {
        return Ok(EntryResult::InsufficientCapital);
    }

    let position = Position {
        symbol: symbol.to_string(),
        entry_price: price,
        shares,
        entry_date: date,
    };
    let cost = position.cost_basis();
    let record = TradeRecord::buy(date, &position);
    state.ledger.open(position)?;
    state.cash -= cost;
    state.record_trade(record);

    debug!(%date, %symbol, shares, price, cost, cash = state.cash, "buy");

    Ok(EntryResult::Entered {
        shares,
        price,
        cost,
    })
}

/// Close the position in `symbol` at `price`, credit the proceeds and append
/// a Sell record carrying the realized profit.
pub fn exit_position(
    state: &mut SimulationState,
    symbol: &str,
    price: f64,
    date: NaiveDate,
) -> Result<TradeRecord, RotatorError> {
    let position = state.ledger.close(symbol)?;
    let record = TradeRecord::sell(date, &position, price);

    state.cash += position.market_value(price);
    state.record_trade(record.clone());

    debug!(
        %date,
        %symbol,
        shares = position.shares,
        price,
        profit = record.profit.unwrap_or_default(),
        cash = state.cash,
        "sell"
    );

    Ok(record)
}

/// Sell every symbol in `symbols`. A held symbol without a price is an
/// invariant violation: the price table is forward-filled.
pub fn liquidate(
    state: &mut SimulationState,
    symbols: &[String],
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
) -> Result<usize, RotatorError> {
    for symbol in symbols {
        let price = price_map
            .get(symbol)
            .copied()
            .ok_or_else(|| RotatorError::MissingPrice {
                symbol: symbol.clone(),
                date,
            })?;
        exit_position(state, symbol, price, date)?;
    }
    Ok(symbols.len())
}

/// Buy into free slots from `candidates`, in order.
///
/// Only the first `available_slots` unheld candidates are attempted; a
/// candidate that cannot afford a share leaves its slot empty for the day.
pub fn acquire(
    state: &mut SimulationState,
    candidates: &[String],
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
    fraction: f64,
) -> Result<usize, RotatorError> {
    let slots = state.ledger.available_slots();
    let to_buy: Vec<&String> = candidates
        .iter()
        .filter(|s| !state.ledger.contains(s))
        .take(slots)
        .collect();

    let mut bought = 0;
    for symbol in to_buy {
        let Some(&price) = price_map.get(symbol) else {
            debug!(%date, %symbol, "candidate has no price, skipped");
            continue;
        };
        match enter_position(state, symbol, price, date, fraction)? {
            EntryResult::Entered { .. } => bought += 1,
            EntryResult::InsufficientCapital | EntryResult::NonPositivePrice => {
                debug!(%date, %symbol, price, cash = state.cash, "buy skipped");
            }
        }
    }
    Ok(bought)
}

/// Counts of the trades one rotation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationFills {
    pub sold: usize,
    pub bought: usize,
}

/// Apply a day's rotation: every liquidation first, then acquisitions into
/// the slots that frees.
pub fn execute_rotation(
    state: &mut SimulationState,
    rotation: &Rotation,
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
    fraction: f64,
) -> Result<RotationFills, RotatorError> {
    let sold = liquidate(state, &rotation.liquidate, price_map, date)?;
    let bought = acquire(state, &rotation.candidates, price_map, date, fraction)?;
    Ok(RotationFills { sold, bought })
}

/// Force-close every open position at `price_map`. A second call finds the
/// ledger empty and does nothing.
pub fn liquidate_all(
    state: &mut SimulationState,
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
) -> Result<usize, RotatorError> {
    let held: Vec<String> = state.ledger.holdings().into_iter().map(String::from).collect();
    liquidate(state, &held, price_map, date)
}
