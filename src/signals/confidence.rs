// =============================================================================
// Confidence Scorer: Weighted-factor scoring shared by every strategy
// =============================================================================
//
//   confidence = clamp(base + sum(weight_i * score_i), 0, 100)
//
// Boolean factors score 1 or 0; point factors carry their own value with a
// weight of one.  Stateless and deterministic.
// =============================================================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const MIN_CONFIDENCE: Decimal = Decimal::ZERO;
pub const MAX_CONFIDENCE: Decimal = Decimal::ONE_HUNDRED;

/// A single input to the scorer.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFactor {
    pub name: &'static str,
    pub weight: Decimal,
    pub score: Decimal,
}

impl ConfidenceFactor {
    /// Adds `weight` when `active`, nothing otherwise.
    pub fn flag(name: &'static str, weight: Decimal, active: bool) -> Self {
        Self {
            name,
            weight,
            score: if active { Decimal::ONE } else { Decimal::ZERO },
        }
    }

    /// Adds `points` directly.
    pub fn points(name: &'static str, points: Decimal) -> Self {
        Self {
            name,
            weight: Decimal::ONE,
            score: points,
        }
    }

    pub fn contribution(&self) -> Decimal {
        self.weight * self.score
    }
}

/// The contribution of a single factor to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    pub contribution: Decimal,
}

/// Result of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Clamped to `[0, 100]`.
    pub value: Decimal,
    /// Unclamped sum, kept for diagnostics.
    pub raw: Decimal,
    pub contributions: Vec<FactorContribution>,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    base: Decimal,
}

impl ConfidenceScorer {
    pub const fn new(base: Decimal) -> Self {
        Self { base }
    }

    /// Scorer used for EMA bounce signals (no base).
    pub const fn bounce() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Scorer used for zone signals (base 50).
    pub fn zone() -> Self {
        Self::new(dec!(50))
    }

    pub fn score(&self, factors: &[ConfidenceFactor]) -> ConfidenceScore {
        let mut raw = self.base;
        let mut contributions = Vec::with_capacity(factors.len());

        for factor in factors {
            let contribution = factor.contribution();
            raw += contribution;
            contributions.push(FactorContribution {
                name: factor.name.to_string(),
                contribution,
            });
        }

        ConfidenceScore {
            value: raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
            raw,
            contributions,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::bounce()
    }
}
