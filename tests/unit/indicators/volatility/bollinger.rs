//! Unit tests for Bollinger Bands

use approx::assert_relative_eq;
use quotrix::indicators::bollinger;

#[test]
fn unavailable_below_period_samples() {
    let prices = vec![100.0; 19];
    assert!(bollinger(&prices, 20, 2.0).is_none());
}

#[test]
fn matches_hand_computed_population_deviation() {
    // Classic dataset: mean = 5, population sigma = 2.
    let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let bands = bollinger(&prices, 8, 2.0).unwrap();
    assert_relative_eq!(bands.middle, 5.0);
    assert_relative_eq!(bands.upper, 9.0);
    assert_relative_eq!(bands.lower, 1.0);
}

#[test]
fn bands_are_ordered_for_any_sufficient_input() {
    let prices: Vec<f64> = (0..60)
        .map(|i| 100.0 + ((i * 11) % 17) as f64 - 8.0)
        .collect();
    let bands = bollinger(&prices, 20, 2.0).unwrap();
    assert!(bands.upper >= bands.middle);
    assert!(bands.middle >= bands.lower);
}

#[test]
fn constant_series_collapses_the_envelope() {
    let prices = vec![7.5; 25];
    let bands = bollinger(&prices, 20, 2.0).unwrap();
    assert_relative_eq!(bands.upper, 7.5);
    assert_relative_eq!(bands.lower, 7.5);
}
