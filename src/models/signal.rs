//! Directional signals produced by the scoring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::market::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Buy,
    Sell,
}

/// One scored directional call. Created by the signal generator, handed to
/// the subscriber once, and never mutated afterwards; the core keeps no
/// signal history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: Instrument,
    pub direction: SignalDirection,
    /// Always within `[0.6, 0.95]`.
    pub confidence: f64,
    /// RSI reading at generation time, within `[0, 100]`.
    pub rsi: f64,
    pub price: f64,
    pub generated_at: DateTime<Utc>,
}
