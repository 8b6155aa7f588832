//! Unit tests for the EMA indicator

use approx::assert_relative_eq;
use quotrix::indicators::{ema, sma};

#[test]
fn matches_hand_computed_recurrence() {
    // Seed = mean(1, 2) = 1.5, k = 2/3:
    // ema = 3 * 2/3 + 1.5 * 1/3 = 2.5
    // ema = 4 * 2/3 + 2.5 * 1/3 = 3.5
    let prices = vec![1.0, 2.0, 3.0, 4.0];
    assert_relative_eq!(ema(&prices, 2), 3.5);
}

#[test]
fn degrades_to_plain_mean_when_short() {
    let prices = vec![2.0, 4.0, 6.0];
    assert_relative_eq!(ema(&prices, 10), sma(&prices, 3));
}

#[test]
fn tracks_a_flat_series_exactly() {
    let prices = vec![42.0; 30];
    assert_relative_eq!(ema(&prices, 12), 42.0);
}

#[test]
fn leans_toward_recent_prices() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    assert!(ema(&prices, 5) > ema(&prices, 20));
}
