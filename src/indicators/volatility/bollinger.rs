//! Bollinger Bands indicator

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands over the last `period` prices.
///
/// Middle = mean, upper/lower = mean +/- `std_dev` population standard
/// deviations. Returns `None` when fewer than `period` values exist.
pub fn bollinger(prices: &[f64], period: usize, std_dev: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
    let sigma = variance.sqrt();

    Some(BollingerBands {
        upper: mean + std_dev * sigma,
        middle: mean,
        lower: mean - std_dev * sigma,
    })
}
