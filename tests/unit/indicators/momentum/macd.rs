//! Unit tests for the MACD indicator

use quotrix::indicators::macd;

fn ascending(count: usize) -> Vec<f64> {
    (0..count).map(|i| 100.0 + i as f64).collect()
}

#[test]
fn unavailable_below_slow_plus_signal_samples() {
    assert!(macd(&ascending(34), 12, 26, 9).is_none());
    assert!(macd(&ascending(35), 12, 26, 9).is_some());
}

#[test]
fn histogram_is_exactly_macd_minus_signal() {
    let result = macd(&ascending(60), 12, 26, 9).unwrap();
    assert_eq!(result.histogram, result.macd - result.signal);
}

#[test]
fn ascending_prices_give_positive_histogram() {
    let result = macd(&ascending(40), 12, 26, 9).unwrap();
    assert!(result.macd > 0.0);
    assert!(result.histogram > 0.0);
}

#[test]
fn descending_prices_give_negative_histogram() {
    let prices: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
    let result = macd(&prices, 12, 26, 9).unwrap();
    assert!(result.macd < 0.0);
    assert!(result.histogram < 0.0);
}

#[test]
fn flat_prices_give_zero_lines() {
    let prices = vec![100.0; 50];
    let result = macd(&prices, 12, 26, 9).unwrap();
    assert_eq!(result.macd, 0.0);
    assert_eq!(result.signal, 0.0);
    assert_eq!(result.histogram, 0.0);
}
