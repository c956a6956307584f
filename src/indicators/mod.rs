// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the signal
// detectors consume: the EMA stack, cumulative VWAP and MACD.  Every function
// returns an empty series on insufficient data instead of failing.

pub mod ema;
pub mod macd;
pub mod vwap;

pub use ema::{ema, ema_points, EmaPoint};
pub use macd::{macd, macd_points, MacdPoint, MacdValue};
pub use vwap::{vwap, VwapPoint};

use rust_decimal::Decimal;

use crate::market_data::Candle;
use crate::runtime_config::AnalysisParams;

// =============================================================================
// AlignedSeries
// =============================================================================

/// An indicator series paired with the input index of its first value.
///
/// Warm-up shortens every series; `at(i)` maps a candle index back onto the
/// series so callers never do the offset arithmetic themselves.
#[derive(Debug, Clone, Default)]
pub struct AlignedSeries<T = Decimal> {
    values: Vec<T>,
    offset: usize,
}

impl<T: Copy> AlignedSeries<T> {
    pub fn new(values: Vec<T>, offset: usize) -> Self {
        Self { values, offset }
    }

    /// Value for candle index `index`, if the series has warmed up by then.
    pub fn at(&self, index: usize) -> Option<T> {
        index
            .checked_sub(self.offset)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

// =============================================================================
// IndicatorSet
// =============================================================================

/// Every indicator derived from one candle window, computed once per analysis.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub ema_fast: AlignedSeries,
    pub ema_medium: AlignedSeries,
    pub ema_slow: AlignedSeries,
    pub vwap: Vec<VwapPoint>,
    pub macd: AlignedSeries<MacdValue>,
}

impl IndicatorSet {
    pub fn compute(candles: &[Candle], params: &AnalysisParams) -> Self {
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();

        Self {
            ema_fast: ema::ema_aligned(&closes, params.fast_ema_period),
            ema_medium: ema::ema_aligned(&closes, params.medium_ema_period),
            ema_slow: ema::ema_aligned(&closes, params.slow_ema_period),
            vwap: vwap(candles),
            macd: macd::macd_aligned(
                &closes,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            ),
        }
    }

    /// The EMA stack as timestamped points (see [`ema_points`]).
    pub fn ema_points(&self, candles: &[Candle]) -> Vec<EmaPoint> {
        ema::stack_points(candles, &self.ema_fast, &self.ema_medium, &self.ema_slow)
    }

    /// MACD points stamped with the close time of their candle.
    pub fn macd_points(&self, candles: &[Candle]) -> Vec<MacdPoint> {
        macd::stamp(candles, &self.macd)
    }

    /// `(fast, medium, slow)` EMA values at candle `index`.
    pub fn ema_stack_at(&self, index: usize) -> Option<(Decimal, Decimal, Decimal)> {
        Some((
            self.ema_fast.at(index)?,
            self.ema_medium.at(index)?,
            self.ema_slow.at(index)?,
        ))
    }

    pub fn vwap_at(&self, index: usize) -> Option<Decimal> {
        self.vwap.get(index).map(|p| p.vwap)
    }

    pub fn macd_at(&self, index: usize) -> Option<MacdValue> {
        self.macd.at(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn aligned_series_maps_indices() {
        let s = AlignedSeries::new(vec![dec!(1), dec!(2), dec!(3)], 4);
        assert_eq!(s.at(3), None);
        assert_eq!(s.at(4), Some(dec!(1)));
        assert_eq!(s.at(6), Some(dec!(3)));
        assert_eq!(s.at(7), None);
    }

    #[test]
    fn indicator_set_short_window_has_no_slow_ema() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| Candle {
                open_time: i * 60_000,
                close_time: i * 60_000 + 59_999,
                open: dec!(10),
                high: dec!(11),
                low: dec!(9),
                close: dec!(10),
                volume: dec!(1),
            })
            .collect();
        let set = IndicatorSet::compute(&candles, &AnalysisParams::default());
        assert!(set.ema_slow.is_empty());
        assert!(set.ema_points(&candles).is_empty());
        assert_eq!(set.vwap.len(), 50);
        assert!(set.ema_fast.at(8).is_some());
        assert!(set.macd_at(33).is_some());
        assert!(set.macd_at(32).is_none());
    }
}
