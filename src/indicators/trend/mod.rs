//! Trend indicators: SMA, EMA, trend classification

pub mod direction;
pub mod ema;
pub mod sma;

pub use direction::{direction, TrendDirection};
pub use ema::ema;
pub use sma::sma;
