//! Rotation selector: ranks the day's scores into eligible (top-N) and
//! selected (top-K) sets and derives what to sell and what to buy.
//!
//! Holding is gated by the eligible set, buying by the selected set. A held
//! asset that slips from top-K to somewhere in top-N is kept; only leaving
//! top-N liquidates it.

use std::collections::HashSet;

use super::momentum::DayScores;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedAsset {
    pub symbol: String,
    pub score: f64,
}

/// The day's rotation decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rotation {
    /// Top-N by descending score.
    pub eligible: Vec<String>,
    /// Top-K of `eligible`.
    pub selected: Vec<String>,
    /// Held symbols outside `eligible`, in holding order.
    pub liquidate: Vec<String>,
    /// Symbols of `selected` not currently held, in ranking order.
    pub candidates: Vec<String>,
}

/// Rank scored assets by descending score.
///
/// The sort is stable, so equal scores keep universe order. There is no
/// secondary criterion.
pub fn rank_assets(day: &DayScores) -> Vec<RankedAsset> {
    let mut ranked: Vec<(&str, f64)> = day
        .scores
        .iter()
        .map(|(symbol, score)| (symbol.as_str(), *score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .map(|(symbol, score)| RankedAsset {
            symbol: symbol.to_string(),
            score,
        })
        .collect()
}

pub fn select<'a, I>(
    day: &DayScores,
    holdings: I,
    eligible_count: usize,
    selected_count: usize,
) -> Rotation
where
    I: IntoIterator<Item = &'a str>,
{
    let ranked = rank_assets(day);

    let eligible: Vec<String> = ranked
        .iter()
        .take(eligible_count)
        .map(|a| a.symbol.clone())
        .collect();
    let selected: Vec<String> = eligible.iter().take(selected_count).cloned().collect();

    let eligible_set: HashSet<&str> = eligible.iter().map(String::as_str).collect();
    let held: Vec<&str> = holdings.into_iter().collect();

    let liquidate: Vec<String> = held
        .iter()
        .filter(|s| !eligible_set.contains(*s))
        .map(|s| s.to_string())
        .collect();

    let candidates: Vec<String> = selected
        .iter()
        .filter(|s| !held.contains(&s.as_str()))
        .cloned()
        .collect();

    Rotation {
        eligible,
        selected,
        liquidate,
        candidates,
    }
}
