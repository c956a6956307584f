// =============================================================================
// Zone Signal Detector: Entries off supply/demand zones
// =============================================================================
//
// The most recent 50 candles are checked against every valid zone.  When a
// candle's range touches a zone:
//
//   demand && close > zone.low   -> BUY   stop = low * 0.99
//                                         target = high + 2 * height
//   supply && close < zone.high  -> SELL  stop = high * 1.01
//                                         target = low - 2 * height
//
// No deduplication: one candle can signal against several zones.
// =============================================================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::confidence::{ConfidenceFactor, ConfidenceScorer};
use crate::market_data::Candle;
use crate::types::Direction;
use crate::zones::{Zone, ZoneStrength, ZoneType};

pub const STRATEGY_TAG: &str = "supply_demand";

/// How many trailing candles are matched against zones.
pub const LOOKBACK_CANDLES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSignal {
    pub timestamp: i64,
    pub direction: Direction,
    /// Close of the touching candle.
    pub price: Decimal,
    pub zone: Zone,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Reward over risk. `None` when the risk leg is exactly zero; may be
    /// negative for degenerate inputs.
    pub reward_risk: Option<Decimal>,
    pub confidence: Decimal,
}

pub fn detect_zone_signals(candles: &[Candle], zones: &[Zone]) -> Vec<ZoneSignal> {
    let start = candles.len().saturating_sub(LOOKBACK_CANDLES);
    let mut signals = Vec::new();

    for candle in &candles[start..] {
        for zone in zones.iter().filter(|z| z.is_valid) {
            if !zone.overlaps(candle.low, candle.high) {
                continue;
            }
            if let Some(signal) = evaluate(candle, zone) {
                signals.push(signal);
            }
        }
    }

    debug!(
        candles = candles.len() - start,
        zones = zones.len(),
        signals = signals.len(),
        "zone signal scan complete"
    );

    signals
}

fn evaluate(candle: &Candle, zone: &Zone) -> Option<ZoneSignal> {
    let price = candle.close;
    let height = zone.height();

    // Levels that leave the decimal range skip the zone.
    let (direction, stop_loss, take_profit, reward, risk) = match zone.zone_type {
        ZoneType::Demand if price > zone.low => {
            let stop = zone.low.checked_mul(dec!(0.99))?;
            let target = zone.high.checked_add(height.checked_mul(dec!(2))?)?;
            let reward = target.checked_sub(price)?;
            (Direction::Buy, stop, target, reward, price.checked_sub(stop)?)
        }
        ZoneType::Supply if price < zone.high => {
            let stop = zone.high.checked_mul(dec!(1.01))?;
            let target = zone.low.checked_sub(height.checked_mul(dec!(2))?)?;
            let reward = price.checked_sub(target)?;
            (Direction::Sell, stop, target, reward, stop.checked_sub(price)?)
        }
        _ => return None,
    };

    Some(ZoneSignal {
        timestamp: candle.close_time,
        direction,
        price,
        zone: zone.clone(),
        stop_loss,
        take_profit,
        reward_risk: reward.checked_div(risk),
        confidence: zone_confidence(zone),
    })
}

/// 50 base, +30 strong / +15 medium, +20 for engulfing reversals, capped at 100.
pub fn zone_confidence(zone: &Zone) -> Decimal {
    ConfidenceScorer::zone()
        .score(&[
            ConfidenceFactor::flag(
                "strong_zone",
                dec!(30),
                zone.strength == ZoneStrength::Strong,
            ),
            ConfidenceFactor::flag(
                "medium_zone",
                dec!(15),
                zone.strength == ZoneStrength::Medium,
            ),
            ConfidenceFactor::flag("reversal_pattern", dec!(20), zone.pattern.is_reversal()),
        ])
        .value
}
