//! Scoring policy parameters.
//!
//! Two parameterizations of the same engine: the primary pipeline wants a
//! clear score majority before it speaks, the lightweight one reports any
//! lean at all and is meant for thin histories.

/// When an accumulated score pair is allowed to become a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitRule {
    /// Emit only when the winning side reaches this score.
    MinScore(f64),
    /// Emit whenever either side scored at all.
    AnyScore,
}

#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    pub name: &'static str,
    /// Minimum window length before evaluation runs.
    pub min_samples: usize,
    pub emit_rule: EmitRule,
    /// Width of the confidence range above the 0.6 floor.
    pub confidence_spread: f64,
}

impl ScoringPolicy {
    pub fn primary() -> Self {
        Self {
            name: "primary",
            min_samples: 20,
            emit_rule: EmitRule::MinScore(3.0),
            confidence_spread: 0.35,
        }
    }

    pub fn lightweight() -> Self {
        Self {
            name: "lightweight",
            min_samples: 10,
            emit_rule: EmitRule::AnyScore,
            confidence_spread: 0.30,
        }
    }

    pub fn should_emit(&self, buy_score: f64, sell_score: f64) -> bool {
        match self.emit_rule {
            EmitRule::MinScore(threshold) => buy_score.max(sell_score) >= threshold,
            EmitRule::AnyScore => buy_score + sell_score > 0.0,
        }
    }
}
