// =============================================================================
// Volume-Weighted Average Price (VWAP)
// =============================================================================
//
//   typical_t = (high_t + low_t + close_t) / 3
//   VWAP_t    = sum(typical_i * volume_i) / sum(volume_i)   for i in 0..=t
//
// Cumulative from the first candle of the supplied window.  While cumulative
// volume is zero the point falls back to that candle's typical price.  If the
// running sums overflow `Decimal`, the series stops at the last good point.
// =============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::market_data::Candle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VwapPoint {
    pub timestamp: i64,
    /// Cumulative volume-weighted price up to and including this candle.
    pub vwap: Decimal,
    /// Volume traded in this candle alone.
    pub volume: Decimal,
}

/// One VWAP point per input candle, fewer if the cumulative sums overflow.
pub fn vwap(candles: &[Candle]) -> Vec<VwapPoint> {
    let mut points = Vec::with_capacity(candles.len());
    let mut cumulative_pv = Decimal::ZERO;
    let mut cumulative_volume = Decimal::ZERO;

    for (i, candle) in candles.iter().enumerate() {
        let Some((pv, volume, vwap)) = accumulate(candle, cumulative_pv, cumulative_volume)
        else {
            warn!(index = i, close_time = candle.close_time, "VWAP overflowed, series truncated");
            break;
        };
        cumulative_pv = pv;
        cumulative_volume = volume;

        points.push(VwapPoint {
            timestamp: candle.close_time,
            vwap,
            volume: candle.volume,
        });
    }

    points
}

/// Fold one candle into the running sums: `(pv, volume, vwap)`.
fn accumulate(
    candle: &Candle,
    cumulative_pv: Decimal,
    cumulative_volume: Decimal,
) -> Option<(Decimal, Decimal, Decimal)> {
    let typical = candle.typical_price()?;
    let pv = cumulative_pv.checked_add(typical.checked_mul(candle.volume)?)?;
    let volume = cumulative_volume.checked_add(candle.volume)?;

    let vwap = if volume.is_zero() {
        typical
    } else {
        pv.checked_div(volume)?
    };
    Some((pv, volume, vwap))
}
