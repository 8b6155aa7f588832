//! EMA (Exponential Moving Average) indicator

use super::sma::sma;

/// Exponential moving average with smoothing `k = 2 / (period + 1)`.
///
/// Seeded with the SMA of the first `period` values, then folded
/// left-to-right over the remainder. Shorter series degrade to the plain
/// mean of what is available.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    let period = period.max(1);
    if prices.len() < period {
        return sma(prices, prices.len().max(1));
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = sma(&prices[..period], period);
    for &price in &prices[period..] {
        ema = price * k + ema * (1.0 - k);
    }
    ema
}
