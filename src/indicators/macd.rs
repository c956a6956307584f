// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd_line   = EMA(fast) - EMA(slow)      (fast series trimmed by slow-fast)
//   signal_line = EMA(macd_line, signal)
//   histogram   = macd_line - signal_line
//
// Output points exist only where the signal line exists, i.e. from input index
// `slow + signal - 2` onward.
// =============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ema, AlignedSeries};
use crate::market_data::Candle;

/// Oscillator, signal and histogram at one aligned point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

impl MacdValue {
    /// Oscillator strictly above its signal line.
    pub fn is_bullish(&self) -> bool {
        self.macd > self.signal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    /// Close time of the candle this point was computed on.
    pub timestamp: i64,
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Compute MACD over `prices`.
///
/// Returns an empty `Vec` when any period is zero, when `fast > slow`, or when
/// there is not enough history for the signal line.
pub fn macd(prices: &[Decimal], fast: usize, slow: usize, signal: usize) -> Vec<MacdValue> {
    if fast == 0 || slow == 0 || signal == 0 || fast > slow {
        return Vec::new();
    }

    let fast_ema = ema(prices, fast);
    let slow_ema = ema(prices, slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return Vec::new();
    }

    // Drop the fast series' extra head so both start on the same price.
    let offset = slow - fast;
    let macd_line: Vec<Decimal> = fast_ema
        .get(offset..)
        .unwrap_or_default()
        .iter()
        .zip(&slow_ema)
        .map_while(|(f, s)| f.checked_sub(*s))
        .collect();

    let signal_line = ema(&macd_line, signal);
    if signal_line.is_empty() {
        return Vec::new();
    }
    let head = signal - 1;

    macd_line[head..]
        .iter()
        .zip(signal_line)
        .map_while(|(&macd, signal)| {
            Some(MacdValue {
                macd,
                signal,
                histogram: macd.checked_sub(signal)?,
            })
        })
        .collect()
}

/// Input index of the first MACD value for the given periods.
pub fn warmup(slow: usize, signal: usize) -> usize {
    (slow + signal).saturating_sub(2)
}

pub(crate) fn macd_aligned(
    prices: &[Decimal],
    fast: usize,
    slow: usize,
    signal: usize,
) -> AlignedSeries<MacdValue> {
    AlignedSeries::new(macd(prices, fast, slow, signal), warmup(slow, signal))
}

/// MACD over candle closes, each point stamped with its candle's close time.
pub fn macd_points(candles: &[Candle], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    stamp(candles, &macd_aligned(&closes, fast, slow, signal))
}

pub(crate) fn stamp(candles: &[Candle], series: &AlignedSeries<MacdValue>) -> Vec<MacdPoint> {
    candles
        .iter()
        .skip(series.offset())
        .zip(series.values())
        .map(|(candle, v)| MacdPoint {
            timestamp: candle.close_time,
            macd: v.macd,
            signal: v.signal,
            histogram: v.histogram,
        })
        .collect()
}
