//! Position ledger: at most `capacity` positions, one per symbol.
//!
//! Positions are kept in the order they were opened. That order drives the
//! liquidation order, so it is part of the deterministic output.

use super::error::RotatorError;
use super::position::Position;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    capacity: usize,
    positions: Vec<Position>,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Ledger {
            capacity,
            positions: Vec::with_capacity(capacity),
        }
    }

    pub fn open(&mut self, position: Position) -> Result<(), RotatorError> {
        if self.contains(&position.symbol) {
            return Err(RotatorError::DuplicateSymbol {
                symbol: position.symbol,
            });
        }
        if self.positions.len() >= self.capacity {
            return Err(RotatorError::LedgerFull {
                symbol: position.symbol,
                capacity: self.capacity,
            });
        }
        self.positions.push(position);
        Ok(())
    }

    pub fn close(&mut self, symbol: &str) -> Result<Position, RotatorError> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.symbol == symbol)
            .ok_or_else(|| RotatorError::NotHeld {
                symbol: symbol.to_string(),
            })?;
        Ok(self.positions.remove(idx))
    }

    pub fn holdings(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.symbol.as_str()).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.iter().any(|p| p.symbol == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_slots(&self) -> usize {
        self.capacity.saturating_sub(self.positions.len())
    }

    /// Mark-to-market value of every position with a price in `price_map`.
    pub fn market_value(&self, price_map: &HashMap<String, f64>) -> f64 {
        self.positions
            .iter()
            .filter_map(|pos| price_map.get(&pos.symbol).map(|&p| pos.market_value(p)))
            .sum()
    }

    pub fn unrealized_pnl(&self, price_map: &HashMap<String, f64>) -> f64 {
        self.positions
            .iter()
            .filter_map(|pos| price_map.get(&pos.symbol).map(|&p| pos.unrealized_pnl(p)))
            .sum()
    }
}
