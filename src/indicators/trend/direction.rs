//! Trend classification from stacked moving averages

use super::sma::sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

/// Classify the trend by comparing SMA(5), SMA(10), and SMA(20).
///
/// Strictly descending periods stacked in order mean `Up`, the reverse
/// means `Down`. Needs at least 20 samples, otherwise `Neutral`.
pub fn direction(prices: &[f64]) -> TrendDirection {
    if prices.len() < 20 {
        return TrendDirection::Neutral;
    }

    let short = sma(prices, 5);
    let medium = sma(prices, 10);
    let long = sma(prices, 20);

    if short > medium && medium > long {
        TrendDirection::Up
    } else if short < medium && medium < long {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    }
}
