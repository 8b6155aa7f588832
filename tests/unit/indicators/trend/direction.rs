//! Unit tests for trend classification

use quotrix::indicators::{direction, TrendDirection};

#[test]
fn neutral_below_twenty_samples() {
    let prices: Vec<f64> = (0..19).map(|i| 100.0 + i as f64).collect();
    assert_eq!(direction(&prices), TrendDirection::Neutral);
}

#[test]
fn stacked_ascending_averages_mean_up() {
    let prices: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    assert_eq!(direction(&prices), TrendDirection::Up);
}

#[test]
fn stacked_descending_averages_mean_down() {
    let prices: Vec<f64> = (0..25).map(|i| 200.0 - i as f64).collect();
    assert_eq!(direction(&prices), TrendDirection::Down);
}

#[test]
fn flat_series_is_neutral() {
    let prices = vec![100.0; 25];
    assert_eq!(direction(&prices), TrendDirection::Neutral);
}
