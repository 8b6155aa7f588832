//! Signal generator: indicators in, at most one directional call out.

use chrono::Utc;

use crate::indicators::{rsi, DEFAULT_RSI_PERIOD};
use crate::models::{Instrument, Signal};

use super::policy::ScoringPolicy;
use super::scoring;

pub struct SignalGenerator {
    policy: ScoringPolicy,
}

impl SignalGenerator {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Evaluate a price series and produce a signal when the policy's
    /// emission rule is met. Series shorter than the policy's minimum
    /// sample count never produce a signal.
    pub fn evaluate(&self, instrument: &Instrument, prices: &[f64]) -> Option<Signal> {
        if prices.len() < self.policy.min_samples {
            return None;
        }
        let price = *prices.last()?;

        let (buy_score, sell_score) = scoring::score_prices(prices);
        let (direction, confidence) = scoring::decide(&self.policy, buy_score, sell_score)?;

        Some(Signal {
            instrument: instrument.clone(),
            direction,
            confidence,
            rsi: rsi(prices, DEFAULT_RSI_PERIOD),
            price,
            generated_at: Utc::now(),
        })
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(ScoringPolicy::primary())
    }
}
