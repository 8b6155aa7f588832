//! Instruments, price ticks, and the bounded per-instrument history window.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::StreamError;

/// History capacity per instrument; the oldest tick is evicted on overflow.
pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

/// Identifier of a tradable pair.
///
/// The canonical form separates the legs with an underscore (`EUR_USD`);
/// the feed spells the same pair with a space (`EUR USD`). Only the first
/// separator is translated, so exotic names survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(name: &str) -> Result<Self, StreamError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StreamError::InvalidInstrument(name.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build from the feed's spelling (`EUR USD` -> `EUR_USD`).
    pub fn from_wire(symbol: &str) -> Self {
        Self(symbol.replacen(' ', "_", 1))
    }

    /// The feed's spelling (`EUR_USD` -> `EUR USD`).
    pub fn wire_symbol(&self) -> String {
        self.0.replacen('_', " ", 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single accepted price observation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub instrument: Instrument,
    pub price: f64,
    pub observed_at: Instant,
}

impl PriceTick {
    /// Returns `None` unless the price is finite and positive; the feed
    /// occasionally carries junk values and those never enter a window.
    pub fn new(instrument: Instrument, price: f64) -> Option<Self> {
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        Some(Self {
            instrument,
            price,
            observed_at: Instant::now(),
        })
    }
}

/// Insertion-ordered bounded history of ticks for one instrument.
///
/// Holds at most `capacity` entries, evicting the oldest first, and keeps
/// `observed_at` non-decreasing by dropping out-of-order pushes.
#[derive(Debug, Clone)]
pub struct MarketDataWindow {
    ticks: VecDeque<PriceTick>,
    capacity: usize,
}

impl MarketDataWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            ticks: VecDeque::with_capacity(capacity.min(DEFAULT_WINDOW_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Append a tick, evicting from the front when over capacity.
    pub fn push(&mut self, tick: PriceTick) {
        if let Some(last) = self.ticks.back() {
            if tick.observed_at < last.observed_at {
                return;
            }
        }
        self.ticks.push_back(tick);
        while self.ticks.len() > self.capacity {
            self.ticks.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn last(&self) -> Option<&PriceTick> {
        self.ticks.back()
    }

    /// Prices oldest-first, the ordering every indicator expects.
    pub fn prices(&self) -> Vec<f64> {
        self.ticks.iter().map(|t| t.price).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceTick> {
        self.ticks.iter()
    }
}

impl Default for MarketDataWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
