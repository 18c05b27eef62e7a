//! Open positions and the immutable trade log entries.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub shares: u64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "Buy"),
            TradeAction::Sell => write!(f, "Sell"),
        }
    }
}

/// One executed trade. `profit` is set on sells only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub shares: u64,
    pub profit: Option<f64>,
}

impl TradeRecord {
    pub fn buy(date: NaiveDate, position: &Position) -> Self {
        TradeRecord {
            date,
            symbol: position.symbol.clone(),
            action: TradeAction::Buy,
            price: position.entry_price,
            shares: position.shares,
            profit: None,
        }
    }

    /// Sell record for `position` closed at `exit_price`.
    pub fn sell(date: NaiveDate, position: &Position, exit_price: f64) -> Self {
        TradeRecord {
            date,
            symbol: position.symbol.clone(),
            action: TradeAction::Sell,
            price: exit_price,
            shares: position.shares,
            profit: Some(position.unrealized_pnl(exit_price)),
        }
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }

    /// Signed cash movement: negative for buys, positive for sells.
    pub fn cash_flow(&self) -> f64 {
        let notional = self.shares as f64 * self.price;
        match self.action {
            TradeAction::Buy => -notional,
            TradeAction::Sell => notional,
        }
    }
}
