//! MACD (Moving Average Convergence Divergence) indicator

use crate::indicators::trend::ema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Calculate MACD
///
/// MACD line = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of the trailing MACD-line values
/// Histogram = MACD - Signal
///
/// Returns `None` when fewer than `slow + signal` prices are available.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if signal == 0 || prices.len() < slow + signal {
        return None;
    }

    let macd_line = ema(prices, fast) - ema(prices, slow);

    // One MACD-line value per prefix long enough to cover the slow EMA.
    let mut series = Vec::with_capacity(prices.len() - slow);
    for end in slow..prices.len() {
        let prefix = &prices[..=end];
        series.push(ema(prefix, fast) - ema(prefix, slow));
    }

    let tail = &series[series.len() - signal..];
    let signal_line = ema(tail, signal);

    Some(Macd {
        macd: macd_line,
        signal: signal_line,
        histogram: macd_line - signal_line,
    })
}
