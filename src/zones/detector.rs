// =============================================================================
// Zone Candidate Detection
// =============================================================================
//
// Every interior candle (skipping the first two and last two) is tested
// against four patterns, in order:
//
//   1. Bullish engulfing  prev.close < open  && close > prev.high  -> demand
//   2. Bearish engulfing  prev.close > open  && close < prev.low   -> supply
//   3. Demand pin bar     lower wick > 2*body && lower wick > 2*upper wick
//   4. Supply pin bar     upper wick > 2*body && upper wick > 2*lower wick
//
// Each hit emits its own candidate, so one candle can produce several.
// Pin bars are strong when the rejection wick exceeds 3x the body, medium
// otherwise.
// =============================================================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{PatternTag, Zone, ZoneStrength, ZoneType};
use crate::market_data::Candle;

/// Shortest window zone detection will look at.
pub const MIN_CANDLES: usize = 10;

/// Scan `candles` for zone candidates in chronological order.
pub fn detect_candidates(candles: &[Candle]) -> Vec<Zone> {
    if candles.len() < MIN_CANDLES {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    for i in 2..candles.len() - 2 {
        let prev = &candles[i - 1];
        let cur = &candles[i];

        if let Some(zone) = bullish_engulfing(prev, cur) {
            candidates.push(zone);
        }
        if let Some(zone) = bearish_engulfing(prev, cur) {
            candidates.push(zone);
        }
        candidates.extend(pin_bars(cur));
    }

    candidates
}

fn bullish_engulfing(prev: &Candle, cur: &Candle) -> Option<Zone> {
    if !(prev.close < cur.open && cur.close > prev.high) {
        return None;
    }
    Some(Zone {
        zone_type: ZoneType::Demand,
        high: cur.high,
        low: cur.low.min(prev.low),
        timestamp: cur.close_time,
        strength: ZoneStrength::Strong,
        pattern: PatternTag::BullishEngulfing,
        is_valid: true,
    })
}

fn bearish_engulfing(prev: &Candle, cur: &Candle) -> Option<Zone> {
    if !(prev.close > cur.open && cur.close < prev.low) {
        return None;
    }
    Some(Zone {
        zone_type: ZoneType::Supply,
        high: cur.high.max(prev.high),
        low: cur.low,
        timestamp: cur.close_time,
        strength: ZoneStrength::Strong,
        pattern: PatternTag::BearishEngulfing,
        is_valid: true,
    })
}

fn pin_bars(cur: &Candle) -> Vec<Zone> {
    let body = cur.body();
    let upper = cur.upper_wick();
    let lower = cur.lower_wick();
    let strength = |wick: Decimal| {
        if wick > body.saturating_mul(dec!(3)) {
            ZoneStrength::Strong
        } else {
            ZoneStrength::Medium
        }
    };

    let mut zones = Vec::new();

    // Band covers the rejection wick and the body.
    if lower > body.saturating_mul(dec!(2)) && lower > upper.saturating_mul(dec!(2)) {
        zones.push(Zone {
            zone_type: ZoneType::Demand,
            high: cur.open.max(cur.close),
            low: cur.low,
            timestamp: cur.close_time,
            strength: strength(lower),
            pattern: PatternTag::BullishPinBar,
            is_valid: true,
        });
    }

    if upper > body.saturating_mul(dec!(2)) && upper > lower.saturating_mul(dec!(2)) {
        zones.push(Zone {
            zone_type: ZoneType::Supply,
            high: cur.high,
            low: cur.open.min(cur.close),
            timestamp: cur.close_time,
            strength: strength(upper),
            pattern: PatternTag::BearishPinBar,
            is_valid: true,
        });
    }

    zones
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            open_time: i as i64 * 60_000,
            close_time: i as i64 * 60_000 + 59_999,
            open,
            high,
            low,
            close,
            volume: dec!(10),
        }
    }

    fn flat(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| bar(i, dec!(100), dec!(100), dec!(100), dec!(100)))
            .collect()
    }

    #[test]
    fn short_window_has_no_candidates() {
        let mut candles = flat(9);
        candles[4] = bar(4, dec!(100), dec!(100), dec!(90), dec!(100));
        assert!(detect_candidates(&candles).is_empty());
    }

    #[test]
    fn flat_window_has_no_candidates() {
        assert!(detect_candidates(&flat(50)).is_empty());
    }

    #[test]
    fn bullish_engulfing_band() {
        let mut candles = flat(20);
        candles[9] = bar(9, dec!(100), dec!(102), dec!(98), dec!(100));
        candles[10] = bar(10, dec!(101), dec!(105), dec!(99), dec!(105));
        let zones = detect_candidates(&candles);
        assert_eq!(zones.len(), 1);
        let z = &zones[0];
        assert_eq!(z.zone_type, ZoneType::Demand);
        assert_eq!(z.pattern, PatternTag::BullishEngulfing);
        assert_eq!(z.strength, ZoneStrength::Strong);
        assert_eq!((z.low, z.high), (dec!(98), dec!(105)));
        assert_eq!(z.timestamp, candles[10].close_time);
    }

    #[test]
    fn bearish_engulfing_band() {
        let mut candles = flat(20);
        candles[9] = bar(9, dec!(100), dec!(103), dec!(97), dec!(100));
        candles[10] = bar(10, dec!(99), dec!(101), dec!(95), dec!(95));
        let zones = detect_candidates(&candles);
        assert_eq!(zones.len(), 1);
        let z = &zones[0];
        assert_eq!(z.zone_type, ZoneType::Supply);
        assert_eq!((z.low, z.high), (dec!(95), dec!(103)));
    }

    #[test]
    fn hammer_is_demand_pin_bar() {
        let mut candles = flat(20);
        // body 1, upper wick 0.5, lower wick 5 -> strong
        candles[8] = bar(8, dec!(100), dec!(101.5), dec!(95), dec!(101));
        let zones = detect_candidates(&candles);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, ZoneType::Demand);
        assert_eq!(zones[0].pattern, PatternTag::BullishPinBar);
        assert_eq!(zones[0].strength, ZoneStrength::Strong);
        assert_eq!((zones[0].low, zones[0].high), (dec!(95), dec!(101)));
    }

    #[test]
    fn pin_bar_medium_when_wick_under_three_bodies() {
        let mut candles = flat(20);
        // body 2, upper wick 0, lower wick 5 -> 5 > 4 but 5 < 6
        candles[8] = bar(8, dec!(102), dec!(102), dec!(95), dec!(100));
        let zones = detect_candidates(&candles);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].strength, ZoneStrength::Medium);
    }

    #[test]
    fn shooting_star_is_supply_pin_bar() {
        let mut candles = flat(20);
        // body 0.3, upper wick 6, lower wick 0.2
        candles[12] = bar(12, dec!(100), dec!(106), dec!(99.5), dec!(99.7));
        let zones = detect_candidates(&candles);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, ZoneType::Supply);
        assert_eq!(zones[0].pattern, PatternTag::BearishPinBar);
        assert_eq!(zones[0].strength, ZoneStrength::Strong);
        assert_eq!((zones[0].low, zones[0].high), (dec!(99.7), dec!(106)));
    }

    #[test]
    fn one_candle_can_emit_engulfing_and_pin_bar() {
        let mut candles = flat(20);
        candles[9] = bar(9, dec!(100), dec!(101), dec!(99), dec!(100));
        // Closes above prev high, opens above prev close, long lower wick.
        candles[10] = bar(10, dec!(101), dec!(102), dec!(90), dec!(101.5));
        let zones = detect_candidates(&candles);
        let patterns: Vec<PatternTag> = zones.iter().map(|z| z.pattern).collect();
        assert_eq!(
            patterns,
            vec![PatternTag::BullishEngulfing, PatternTag::BullishPinBar]
        );
    }

    #[test]
    fn edge_candles_are_skipped() {
        let mut candles = flat(12);
        candles[1] = bar(1, dec!(100), dec!(100), dec!(80), dec!(100));
        candles[10] = bar(10, dec!(100), dec!(100), dec!(80), dec!(100));
        assert!(detect_candidates(&candles).is_empty());
    }

    #[test]
    fn full_range_candle_does_not_panic() {
        let mut candles = flat(20);
        // Body saturates at MAX, so the wick comparisons cannot overflow.
        candles[8] = bar(8, Decimal::MIN, Decimal::MAX, Decimal::MIN, Decimal::MAX);
        assert!(detect_candidates(&candles).is_empty());
    }
}
