//! Score accumulation and confidence calculation

use crate::indicators::{bollinger, macd, rsi, DEFAULT_RSI_PERIOD};
use crate::models::SignalDirection;

use super::policy::ScoringPolicy;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

pub const CONFIDENCE_FLOOR: f64 = 0.6;
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Accumulate independent buy/sell score contributions over a price series.
///
/// RSI zones weigh 2 (deep) or 1 (mild), MACD histogram sign and a close
/// outside the Bollinger envelope weigh 1.5 each, and the last price step
/// adds 0.5 of short-term momentum. Indicators without enough data simply
/// contribute nothing.
pub fn score_prices(prices: &[f64]) -> (f64, f64) {
    let mut buy_score = 0.0;
    let mut sell_score = 0.0;

    let current = match prices.last() {
        Some(&p) => p,
        None => return (0.0, 0.0),
    };

    let rsi_value = rsi(prices, DEFAULT_RSI_PERIOD);
    if rsi_value < 30.0 {
        buy_score += 2.0;
    } else if rsi_value < 40.0 {
        buy_score += 1.0;
    } else if rsi_value > 70.0 {
        sell_score += 2.0;
    } else if rsi_value > 60.0 {
        sell_score += 1.0;
    }

    if let Some(m) = macd(prices, MACD_FAST, MACD_SLOW, MACD_SIGNAL) {
        if m.histogram > 0.0 {
            buy_score += 1.5;
        } else if m.histogram < 0.0 {
            sell_score += 1.5;
        }
    }

    if let Some(bands) = bollinger(prices, BOLLINGER_PERIOD, BOLLINGER_STD_DEV) {
        if current < bands.lower {
            buy_score += 1.5;
        } else if current > bands.upper {
            sell_score += 1.5;
        }
    }

    if prices.len() >= 2 {
        let previous = prices[prices.len() - 2];
        if current > previous {
            buy_score += 0.5;
        } else if current < previous {
            sell_score += 0.5;
        }
    }

    (buy_score, sell_score)
}

/// Turn a score pair into a direction and confidence under a policy.
///
/// Direction goes to the strictly higher score; a tie falls to SELL (the
/// upstream behavior, kept as a policy default rather than a claim of
/// correctness). Confidence is the winning share of the total score mapped
/// onto `[floor, floor + spread]` and clamped to `[0.6, 0.95]`.
pub fn decide(
    policy: &ScoringPolicy,
    buy_score: f64,
    sell_score: f64,
) -> Option<(SignalDirection, f64)> {
    if !policy.should_emit(buy_score, sell_score) {
        return None;
    }

    let direction = if buy_score > sell_score {
        SignalDirection::Buy
    } else {
        SignalDirection::Sell
    };

    let total = buy_score + sell_score;
    let winning = buy_score.max(sell_score);
    let confidence = (CONFIDENCE_FLOOR + (winning / total) * policy.confidence_spread)
        .clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

    Some((direction, confidence))
}
