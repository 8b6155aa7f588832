//! Subscription bookkeeping.
//!
//! The desired set is independent of connection state: instruments queued
//! while offline are replayed once the handshake is acknowledged, and the
//! set survives reconnects. Only a manual disconnect clears it.

use std::collections::BTreeSet;

use crate::models::Instrument;

#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    instruments: BTreeSet<Instrument>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the instrument was not already present.
    pub fn insert(&mut self, instrument: Instrument) -> bool {
        self.instruments.insert(instrument)
    }

    pub fn remove(&mut self, instrument: &Instrument) -> bool {
        self.instruments.remove(instrument)
    }

    pub fn contains(&self, instrument: &Instrument) -> bool {
        self.instruments.contains(instrument)
    }

    pub fn clear(&mut self) {
        self.instruments.clear();
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Deterministic iteration order, so replay bursts are stable.
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }
}
