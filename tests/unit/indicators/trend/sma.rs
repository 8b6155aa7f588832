//! Unit tests for the SMA indicator

use approx::assert_relative_eq;
use quotrix::indicators::sma;

#[test]
fn mean_of_the_last_period_values() {
    let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    assert_relative_eq!(sma(&prices, 2), 4.5);
    assert_relative_eq!(sma(&prices, 5), 3.0);
}

#[test]
fn degrades_to_mean_of_available_values() {
    let prices = vec![2.0, 4.0];
    assert_relative_eq!(sma(&prices, 10), 3.0);
}

#[test]
fn empty_series_yields_zero() {
    assert_eq!(sma(&[], 5), 0.0);
}
