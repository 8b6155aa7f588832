//! Technical indicators over a most-recent-last price series.
//!
//! Every function is pure and deterministic. Short series never error:
//! each indicator documents its degraded or neutral result instead.

pub mod momentum;
pub mod trend;
pub mod volatility;

pub use momentum::{macd, rsi, Macd, DEFAULT_RSI_PERIOD};
pub use trend::{direction, ema, sma, TrendDirection};
pub use volatility::{bollinger, BollingerBands};
