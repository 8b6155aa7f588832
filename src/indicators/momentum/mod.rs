//! Momentum indicators: RSI, MACD

pub mod macd;
pub mod rsi;

pub use macd::{macd, Macd};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
