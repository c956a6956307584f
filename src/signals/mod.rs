// =============================================================================
// Signals Module
// =============================================================================
//
// Signal generation for the analysis engine:
// - Weighted-factor confidence scoring shared by every strategy
// - EMA bounce (trend-aligned pullback, long only)
// - Supply/demand zone touches

pub mod bounce;
pub mod confidence;
pub mod zone_signal;

pub use bounce::{detect_bounce_signals, BarObservation, BounceSignal, BounceState};
pub use confidence::{ConfidenceFactor, ConfidenceScore, ConfidenceScorer};
pub use zone_signal::{detect_zone_signals, ZoneSignal};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// A signal from any strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    Bounce(BounceSignal),
    Zone(ZoneSignal),
}

impl Signal {
    pub fn strategy_tag(&self) -> &'static str {
        match self {
            Self::Bounce(_) => bounce::STRATEGY_TAG,
            Self::Zone(_) => zone_signal::STRATEGY_TAG,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Bounce(s) => s.timestamp,
            Self::Zone(s) => s.timestamp,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Bounce(s) => s.direction,
            Self::Zone(s) => s.direction,
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            Self::Bounce(s) => s.price,
            Self::Zone(s) => s.price,
        }
    }

    pub fn confidence(&self) -> Decimal {
        match self {
            Self::Bounce(s) => s.confidence,
            Self::Zone(s) => s.confidence,
        }
    }
}

impl From<BounceSignal> for Signal {
    fn from(signal: BounceSignal) -> Self {
        Self::Bounce(signal)
    }
}

impl From<ZoneSignal> for Signal {
    fn from(signal: ZoneSignal) -> Self {
        Self::Zone(signal)
    }
}
