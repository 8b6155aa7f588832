//! Unit tests for score accumulation and the emission decision

use approx::assert_relative_eq;
use quotrix::models::SignalDirection;
use quotrix::signals::{decide, score_prices, ScoringPolicy};

#[test]
fn ascending_series_balances_macd_momentum_against_overbought_rsi() {
    let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
    let (buy, sell) = score_prices(&prices);
    // Positive MACD histogram (+1.5) and the last step up (+0.5) against
    // RSI pinned at 100, deep overbought (+2).
    assert_relative_eq!(buy, 2.0);
    assert_relative_eq!(sell, 2.0);
}

#[test]
fn crash_tick_scores_an_oversold_band_break() {
    let mut prices = vec![100.0; 40];
    prices.push(60.0);
    let (buy, sell) = score_prices(&prices);
    // RSI 0 (+2) and a close below the lower band (+1.5) against the
    // negative MACD histogram (+1.5) and downward momentum (+0.5).
    assert_relative_eq!(buy, 3.5);
    assert_relative_eq!(sell, 2.0);
}

#[test]
fn empty_series_scores_nothing() {
    assert_eq!(score_prices(&[]), (0.0, 0.0));
}

#[test]
fn primary_policy_requires_a_clear_majority() {
    let policy = ScoringPolicy::primary();
    assert!(decide(&policy, 2.5, 0.0).is_none());
    assert!(decide(&policy, 3.0, 0.0).is_some());
}

#[test]
fn lightweight_policy_emits_on_any_lean() {
    let policy = ScoringPolicy::lightweight();
    assert!(decide(&policy, 0.0, 0.0).is_none());
    let (direction, confidence) = decide(&policy, 0.5, 0.0).unwrap();
    assert_eq!(direction, SignalDirection::Buy);
    assert_relative_eq!(confidence, 0.9);
}

#[test]
fn ties_fall_to_sell() {
    let policy = ScoringPolicy::primary();
    let (direction, confidence) = decide(&policy, 3.0, 3.0).unwrap();
    assert_eq!(direction, SignalDirection::Sell);
    assert_relative_eq!(confidence, 0.775);
}

#[test]
fn confidence_is_clamped_to_the_documented_range() {
    for (buy, sell) in [(3.0, 0.0), (3.0, 2.5), (4.0, 3.5), (10.0, 0.1)] {
        let (_, confidence) = decide(&ScoringPolicy::primary(), buy, sell).unwrap();
        assert!(
            (0.6..=0.95).contains(&confidence),
            "confidence {} out of range for {}/{}",
            confidence,
            buy,
            sell
        );
    }
    // A one-sided score maps exactly onto the ceiling.
    let (_, confidence) = decide(&ScoringPolicy::primary(), 5.0, 0.0).unwrap();
    assert_relative_eq!(confidence, 0.95);
}

#[test]
fn direction_follows_the_higher_score() {
    let policy = ScoringPolicy::primary();
    let (direction, _) = decide(&policy, 4.0, 3.0).unwrap();
    assert_eq!(direction, SignalDirection::Buy);
    let (direction, _) = decide(&policy, 1.0, 3.5).unwrap();
    assert_eq!(direction, SignalDirection::Sell);
}
