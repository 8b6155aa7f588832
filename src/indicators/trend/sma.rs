//! SMA (Simple Moving Average) indicator

/// Mean of the last `period` prices.
///
/// With fewer than `period` values the mean of everything available is
/// returned instead; an empty series yields 0.0.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    let period = period.max(1);
    let window = if prices.len() < period {
        prices
    } else {
        &prices[prices.len() - period..]
    };
    window.iter().sum::<f64>() / window.len() as f64
}
