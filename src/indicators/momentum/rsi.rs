//! RSI (Relative Strength Index) indicator

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Calculate RSI over the last `period` price transitions.
///
/// RSI = 100 - (100 / (1 + RS)), RS = average gain / average loss.
/// Returns the neutral value 50 when the series is shorter than
/// `period + 1`, and 100 when the window shows no losses at all.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in prices.len() - period..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
