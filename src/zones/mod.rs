// =============================================================================
// Supply / Demand Zones
// =============================================================================
//
// Zones are price bands inferred from reversal candles:
// - Engulfing bars (two-candle patterns, always strong)
// - Pin bars (single-candle wick rejection, strong or medium)
//
// Detection emits one candidate per qualifying pattern; consolidation then
// folds overlapping same-type candidates and keeps the most recent 20.

pub mod consolidate;
pub mod detector;

pub use consolidate::{consolidate, MAX_ZONES};
pub use detector::{detect_candidates, MIN_CANDLES};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::Candle;

/// Which side of the market a zone is expected to attract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Supply,
    Demand,
}

impl std::fmt::Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supply => write!(f, "supply"),
            Self::Demand => write!(f, "demand"),
        }
    }
}

/// Ordered so that `Weak < Medium < Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStrength {
    Weak,
    Medium,
    Strong,
}

/// Candle pattern a zone was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    BullishEngulfing,
    BearishEngulfing,
    BullishPinBar,
    BearishPinBar,
}

impl PatternTag {
    /// Engulfing bars are the two tags treated as confirmed reversals when
    /// scoring zone signals.
    pub fn is_reversal(self) -> bool {
        matches!(self, Self::BullishEngulfing | Self::BearishEngulfing)
    }
}

/// A supply or demand band. `high >= low` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_type: ZoneType,
    pub high: Decimal,
    pub low: Decimal,
    /// Close time of the candle that formed the zone.
    pub timestamp: i64,
    pub strength: ZoneStrength,
    pub pattern: PatternTag,
    pub is_valid: bool,
}

impl Zone {
    /// Closed-interval overlap with `[low, high]`.
    pub fn overlaps(&self, low: Decimal, high: Decimal) -> bool {
        low <= self.high && high >= self.low
    }

    pub fn height(&self) -> Decimal {
        self.high.saturating_sub(self.low)
    }
}

/// Detect and consolidate zones for a candle window.
///
/// Returns an empty list for windows shorter than [`MIN_CANDLES`].
pub fn detect_zones(candles: &[Candle]) -> Vec<Zone> {
    let candidates = detect_candidates(candles);
    let candidate_count = candidates.len();
    let zones = consolidate(candidates);

    debug!(
        candles = candles.len(),
        candidates = candidate_count,
        zones = zones.len(),
        "zone detection complete"
    );

    zones
}
