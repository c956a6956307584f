// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` closes.
// Arithmetic is checked: an overflowing seed gives an empty series, an
// overflowing step ends the series early.
// =============================================================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::AlignedSeries;
use crate::market_data::Candle;

/// One row of the fast/medium/slow EMA stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaPoint {
    pub timestamp: i64,
    pub fast: Decimal,
    pub medium: Decimal,
    pub slow: Decimal,
}

/// Compute the EMA series for `prices` and look-back `period`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Each output element corresponds to a price starting at index `period - 1`,
/// so the output length is `prices.len() - period + 1` unless a step
/// overflows `Decimal`, in which case the series stops before it.
pub fn ema(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let divisor = Decimal::from(period as u64);
    let multiplier = dec!(2) / (divisor + Decimal::ONE);
    let keep = Decimal::ONE - multiplier;

    // Seed: SMA of the first `period` values.
    let seed = prices[..period]
        .iter()
        .try_fold(Decimal::ZERO, |acc, &p| acc.checked_add(p))
        .and_then(|sum| sum.checked_div(divisor));
    let Some(sma) = seed else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(prices.len() - period + 1);
    result.push(sma);

    let mut prev = sma;
    for &price in &prices[period..] {
        let Some(next) = step(price, prev, multiplier, keep) else {
            break;
        };
        result.push(next);
        prev = next;
    }

    result
}

fn step(price: Decimal, prev: Decimal, multiplier: Decimal, keep: Decimal) -> Option<Decimal> {
    price
        .checked_mul(multiplier)?
        .checked_add(prev.checked_mul(keep)?)
}

/// EMA of `prices` tagged with the input index of its first value.
pub fn ema_aligned(prices: &[Decimal], period: usize) -> AlignedSeries {
    AlignedSeries::new(ema(prices, period), period.saturating_sub(1))
}

/// Build the three-period EMA stack for a candle window.
///
/// Points start at the first candle where all three EMAs exist and carry that
/// candle's close time. Empty when the window is shorter than the longest
/// period.
pub fn ema_points(candles: &[Candle], fast: usize, medium: usize, slow: usize) -> Vec<EmaPoint> {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let fast = ema_aligned(&closes, fast);
    let medium = ema_aligned(&closes, medium);
    let slow = ema_aligned(&closes, slow);
    stack_points(candles, &fast, &medium, &slow)
}

/// Zip three aligned EMA series into [`EmaPoint`]s over the candles where all
/// three are defined.
pub(crate) fn stack_points(
    candles: &[Candle],
    fast: &AlignedSeries,
    medium: &AlignedSeries,
    slow: &AlignedSeries,
) -> Vec<EmaPoint> {
    if fast.is_empty() || medium.is_empty() || slow.is_empty() {
        return Vec::new();
    }
    let start = fast.offset().max(medium.offset()).max(slow.offset());

    candles
        .iter()
        .enumerate()
        .skip(start)
        .filter_map(|(i, candle)| {
            Some(EmaPoint {
                timestamp: candle.close_time,
                fast: fast.at(i)?,
                medium: medium.at(i)?,
                slow: slow.at(i)?,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn flat_candles(n: usize, price: Decimal) -> Vec<Candle> {
        (0..n as i64)
            .map(|i| Candle {
                open_time: i * 60_000,
                close_time: i * 60_000 + 59_999,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: dec!(10),
            })
            .collect()
    }

    // ---- ema -------------------------------------------------------------

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(ema(&[dec!(1), dec!(2), dec!(3)], 0).is_empty());
    }

    #[test]
    fn ema_shorter_than_period_is_empty() {
        for period in 1..8 {
            let prices: Vec<Decimal> = (0..period - 1).map(|i| Decimal::from(i as u64)).collect();
            assert!(ema(&prices, period).is_empty(), "period {period}");
        }
    }

    #[test]
    fn ema_period_equals_length() {
        let out = ema(&[dec!(2), dec!(4), dec!(6)], 3);
        assert_eq!(out, vec![dec!(4)]);
    }

    #[test]
    fn ema_known_values() {
        // 4-period EMA of 1..=6: SMA seed 2.5, multiplier 0.4
        let prices: Vec<Decimal> = (1..=6u64).map(Decimal::from).collect();
        let out = ema(&prices, 4);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], dec!(2.5));
        assert_eq!(out[1], dec!(3.5)); // 5*0.4 + 2.5*0.6
        assert_eq!(out[2], dec!(4.5)); // 6*0.4 + 3.5*0.6
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let prices = vec![dec!(100); 250];
        for period in [9, 20, 200] {
            let out = ema(&prices, period);
            assert_eq!(out.len(), 250 - period + 1);
            assert!(out.iter().all(|v| *v == dec!(100)), "period {period}");
        }
    }

    #[test]
    fn ema_overflowing_seed_is_empty() {
        assert!(ema(&[Decimal::MAX, Decimal::MAX, dec!(1)], 2).is_empty());
    }

    #[test]
    fn ema_large_but_representable_values() {
        let big = dec!(1000000000000000000000000000);
        let out = ema(&[big, big, big, big, big], 3);
        assert_eq!(out, vec![big; 3]);
    }

    // ---- ema_points ------------------------------------------------------

    #[test]
    fn ema_points_start_at_slowest_period() {
        let candles = flat_candles(30, dec!(100));
        let points = ema_points(&candles, 3, 5, 10);
        assert_eq!(points.len(), 21);
        assert_eq!(points[0].timestamp, candles[9].close_time);
        assert!(points
            .iter()
            .all(|p| p.fast == dec!(100) && p.medium == dec!(100) && p.slow == dec!(100)));
    }

    #[test]
    fn ema_points_empty_when_slow_period_unmet() {
        let candles = flat_candles(10, dec!(100));
        assert!(ema_points(&candles, 3, 5, 20).is_empty());
    }
}
