//! Rotation strategy parameters.

pub const DEFAULT_LOOKBACK_WINDOW: usize = 15;
pub const DEFAULT_ELIGIBLE_COUNT: usize = 5;
pub const DEFAULT_SELECTED_COUNT: usize = 2;
pub const DEFAULT_ALLOCATION_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    /// ROC lookback in trading days.
    pub lookback_window: usize,
    /// N: size of the eligible band that keeps a holding alive.
    pub eligible_count: usize,
    /// K: size of the selected set, and the maximum number of positions.
    pub selected_count: usize,
    /// Share of current cash committed to each new position.
    pub allocation_fraction: f64,
}

impl Strategy {
    pub fn max_positions(&self) -> usize {
        self.selected_count
    }

    /// Prices a symbol needs before it can ever be scored.
    pub fn min_history(&self) -> usize {
        self.lookback_window + 1
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            name: "Momentum rotation".to_string(),
            lookback_window: DEFAULT_LOOKBACK_WINDOW,
            eligible_count: DEFAULT_ELIGIBLE_COUNT,
            selected_count: DEFAULT_SELECTED_COUNT,
            allocation_fraction: DEFAULT_ALLOCATION_FRACTION,
        }
    }
}
