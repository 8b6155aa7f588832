//! Signal scoring and generation.

pub mod generator;
pub mod policy;
pub mod scoring;

pub use generator::SignalGenerator;
pub use policy::{EmitRule, ScoringPolicy};
pub use scoring::{decide, score_prices};
