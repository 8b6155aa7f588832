//! Quotrix - streaming technical-signal engine for a Socket.IO-style quote feed.
//!
//! The crate maintains a resilient WebSocket connection to a retail broker's
//! quote stream, keeps a bounded per-instrument price history, and turns
//! indicator readings (RSI, MACD, Bollinger Bands, moving averages) into
//! directional signals with a confidence score.

pub mod config;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod services;
pub mod signals;

pub use error::StreamError;
