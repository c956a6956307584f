// =============================================================================
// EMA Bounce Detector: Trend-aligned pullback and reclaim (long only)
// =============================================================================
//
// Two-state machine threaded through the candle window in chronological
// order:
//
//   IDLE ──cross-up──> WAITING{bars_waited: 0}
//   WAITING ──cross-up──> WAITING{0}                 (re-arm)
//   WAITING ──bar──> WAITING{bars_waited + 1}
//   WAITING ──stack broken / wait exceeded──> IDLE   (abort)
//   WAITING ──bounce + VWAP + MACD──> IDLE           (fire BUY)
//
// cross-up : prev fast <= prev medium && fast > medium && fast > slow
// stack    : fast > medium > slow
// bounce   : low <= fast * (1 + tolerance%) && close > fast
//
// There is no mirrored short-side path.
// =============================================================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::confidence::{ConfidenceFactor, ConfidenceScorer};
use crate::indicators::IndicatorSet;
use crate::market_data::Candle;
use crate::runtime_config::AnalysisParams;
use crate::types::Direction;

pub const STRATEGY_TAG: &str = "ema_bounce";

// =============================================================================
// State machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BounceState {
    #[default]
    Idle,
    Waiting { bars_waited: u32 },
}

/// What the detector saw on one bar, reduced to the booleans the state
/// machine needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarObservation {
    pub cross_up: bool,
    pub bullish_stack: bool,
    /// Bounce condition, close above VWAP and MACD above signal, all at once.
    pub entry_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: BounceState,
    /// `Some(bars_waited)` when this bar fired a signal.
    pub fired: Option<u32>,
}

impl BounceState {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting { .. })
    }

    /// Apply one bar. `max_wait_bars == 0` disables the timeout.
    pub fn advance(self, obs: &BarObservation, max_wait_bars: u32) -> Step {
        let armed = if obs.cross_up {
            Self::Waiting { bars_waited: 0 }
        } else {
            match self {
                Self::Waiting { bars_waited } => Self::Waiting {
                    bars_waited: bars_waited.saturating_add(1),
                },
                Self::Idle => Self::Idle,
            }
        };

        let Self::Waiting { bars_waited } = armed else {
            return Step {
                next: Self::Idle,
                fired: None,
            };
        };

        let timed_out = max_wait_bars > 0 && bars_waited > max_wait_bars;
        if !obs.bullish_stack || timed_out {
            return Step {
                next: Self::Idle,
                fired: None,
            };
        }

        if obs.entry_ready {
            return Step {
                next: Self::Idle,
                fired: Some(bars_waited),
            };
        }

        Step {
            next: armed,
            fired: None,
        }
    }
}

// =============================================================================
// Signal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BounceSignal {
    pub timestamp: i64,
    pub direction: Direction,
    /// Close of the bounce candle.
    pub price: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub ema_fast: Decimal,
    pub ema_medium: Decimal,
    pub ema_slow: Decimal,
    /// `ema_fast * (1 + tolerance%)`
    pub tolerance_band: Decimal,
    pub vwap: Decimal,
    pub macd: Decimal,
    pub macd_signal: Decimal,
    /// Bars between the arming cross-up and the bounce.
    pub bars_waited: u32,
    pub confidence: Decimal,
}

// =============================================================================
// Detector
// =============================================================================

/// Scan `candles` for EMA bounce entries.
///
/// Needs at least `slow_ema_period` candles; shorter windows return nothing.
/// The scan is strictly sequential because the state carries across bars.
pub fn detect_bounce_signals(
    candles: &[Candle],
    indicators: &IndicatorSet,
    params: &AnalysisParams,
) -> Vec<BounceSignal> {
    if params.slow_ema_period == 0 || candles.len() < params.slow_ema_period {
        return Vec::new();
    }

    let tolerance = Decimal::ONE + params.bounce_tolerance_pct / dec!(100);
    let mut state = BounceState::default();
    let mut signals = Vec::new();

    for (i, candle) in candles.iter().enumerate() {
        let Some((fast, medium, slow)) = indicators.ema_stack_at(i) else {
            continue;
        };

        // The previous bar only needs fast and medium, so a cross can land on
        // the first bar where the slow EMA exists.
        let prev = i.checked_sub(1).and_then(|j| {
            Some((indicators.ema_fast.at(j)?, indicators.ema_medium.at(j)?))
        });
        let cross_up = prev.is_some_and(|(prev_fast, prev_medium)| {
            prev_fast <= prev_medium && fast > medium && fast > slow
        });

        let bullish_stack = fast > medium && medium > slow;
        let band = fast.saturating_mul(tolerance);
        let bounce = candle.low <= band && candle.close > fast;

        let vwap = indicators.vwap_at(i);
        let above_vwap = vwap.is_some_and(|v| candle.close > v);
        let momentum = indicators.macd_at(i);
        let macd_bullish = momentum.is_some_and(|m| m.is_bullish());

        let obs = BarObservation {
            cross_up,
            bullish_stack,
            entry_ready: bounce && above_vwap && macd_bullish,
        };

        let step = state.advance(&obs, params.max_wait_bars);
        state = step.next;

        let (Some(bars_waited), Some(vwap), Some(momentum)) = (step.fired, vwap, momentum) else {
            continue;
        };

        let score = ConfidenceScorer::bounce().score(&[
            ConfidenceFactor::flag("bullish_stack", dec!(25), bullish_stack),
            ConfidenceFactor::flag("above_vwap", dec!(20), above_vwap),
            ConfidenceFactor::flag("macd_bullish", dec!(20), macd_bullish),
            ConfidenceFactor::flag("volume", dec!(15), candle.volume > Decimal::ZERO),
            ConfidenceFactor::points("bounce_quality", bounce_quality(band, candle.low)),
        ]);

        debug!(
            timestamp = candle.close_time,
            price = %candle.close,
            bars_waited,
            confidence = %score.value,
            "ema bounce signal"
        );

        signals.push(BounceSignal {
            timestamp: candle.close_time,
            direction: Direction::Buy,
            price: candle.close,
            low: candle.low,
            volume: candle.volume,
            ema_fast: fast,
            ema_medium: medium,
            ema_slow: slow,
            tolerance_band: band,
            vwap,
            macd: momentum.macd,
            macd_signal: momentum.signal,
            bars_waited,
            confidence: score.value,
        });
    }

    debug!(
        candles = candles.len(),
        signals = signals.len(),
        final_state = ?state,
        "ema bounce scan complete"
    );

    signals
}

/// `max(0, 20 - 100 * (band - low) / band)`: full marks for a low that just
/// tags the band, reaching zero once the undershoot is 20 % of the band.
fn bounce_quality(band: Decimal, low: Decimal) -> Decimal {
    band
        .checked_sub(low)
        .and_then(|undershoot| undershoot.checked_mul(dec!(100)))
        .and_then(|scaled| scaled.checked_div(band))
        .map(|depth_pct| (dec!(20) - depth_pct).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn obs(cross_up: bool, bullish_stack: bool, entry_ready: bool) -> BarObservation {
        BarObservation {
            cross_up,
            bullish_stack,
            entry_ready,
        }
    }

    // ---- state machine ---------------------------------------------------

    #[test]
    fn idle_ignores_entries_without_cross() {
        let step = BounceState::Idle.advance(&obs(false, true, true), 30);
        assert_eq!(step.next, BounceState::Idle);
        assert_eq!(step.fired, None);
    }

    #[test]
    fn cross_up_arms_with_zero_bars() {
        let step = BounceState::Idle.advance(&obs(true, true, false), 30);
        assert_eq!(step.next, BounceState::Waiting { bars_waited: 0 });
    }

    #[test]
    fn waiting_counts_bars() {
        let step = BounceState::Waiting { bars_waited: 4 }.advance(&obs(false, true, false), 30);
        assert_eq!(step.next, BounceState::Waiting { bars_waited: 5 });
    }

    #[test]
    fn cross_up_rearms_while_waiting() {
        let step = BounceState::Waiting { bars_waited: 12 }.advance(&obs(true, true, false), 30);
        assert_eq!(step.next, BounceState::Waiting { bars_waited: 0 });
    }

    #[test]
    fn broken_stack_aborts() {
        let step = BounceState::Waiting { bars_waited: 2 }.advance(&obs(false, false, true), 30);
        assert_eq!(step.next, BounceState::Idle);
        assert_eq!(step.fired, None);
    }

    #[test]
    fn cross_up_without_stack_aborts_immediately() {
        let step = BounceState::Idle.advance(&obs(true, false, true), 30);
        assert_eq!(step.next, BounceState::Idle);
        assert_eq!(step.fired, None);
    }

    #[test]
    fn timeout_only_after_exceeding_max_wait() {
        let at_limit =
            BounceState::Waiting { bars_waited: 29 }.advance(&obs(false, true, false), 30);
        assert_eq!(at_limit.next, BounceState::Waiting { bars_waited: 30 });

        let over = BounceState::Waiting { bars_waited: 30 }.advance(&obs(false, true, true), 30);
        assert_eq!(over.next, BounceState::Idle);
        assert_eq!(over.fired, None);
    }

    #[test]
    fn zero_max_wait_never_times_out() {
        let step =
            BounceState::Waiting { bars_waited: 10_000 }.advance(&obs(false, true, false), 0);
        assert_eq!(step.next, BounceState::Waiting { bars_waited: 10_001 });
    }

    #[test]
    fn entry_fires_and_resets() {
        let step = BounceState::Waiting { bars_waited: 3 }.advance(&obs(false, true, true), 30);
        assert_eq!(step.next, BounceState::Idle);
        assert_eq!(step.fired, Some(4));
    }

    #[test]
    fn can_fire_on_the_arming_bar() {
        let step = BounceState::Idle.advance(&obs(true, true, true), 30);
        assert_eq!(step.fired, Some(0));
        assert!(!step.next.is_waiting());
    }

    // ---- bounce quality --------------------------------------------------

    #[test]
    fn quality_full_when_low_on_band() {
        assert_eq!(bounce_quality(dec!(100), dec!(100)), dec!(20));
    }

    #[test]
    fn quality_fades_with_depth() {
        assert_eq!(bounce_quality(dec!(100), dec!(99.9)), dec!(19.9));
        assert_eq!(bounce_quality(dec!(100), dec!(90)), dec!(10));
        assert_eq!(bounce_quality(dec!(100), dec!(75)), Decimal::ZERO);
    }

    #[test]
    fn quality_zero_band_is_neutral() {
        assert_eq!(bounce_quality(Decimal::ZERO, dec!(1)), Decimal::ZERO);
    }

    #[test]
    fn quality_unrepresentable_depth_is_zero() {
        assert_eq!(bounce_quality(Decimal::MAX, Decimal::MIN), Decimal::ZERO);
        assert_eq!(bounce_quality(Decimal::MAX, dec!(1)), Decimal::ZERO);
    }

    // ---- detector --------------------------------------------------------

    fn flat(n: usize) -> Vec<Candle> {
        (0..n as i64)
            .map(|i| Candle {
                open_time: i * 60_000,
                close_time: i * 60_000 + 59_999,
                open: dec!(100),
                high: dec!(100),
                low: dec!(100),
                close: dec!(100),
                volume: dec!(10),
            })
            .collect()
    }

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

    /// Steady uptrend, a two-bar dip that pulls the fast EMA under the
    /// medium, a recovery that crosses back up, then a candle that wicks
    /// through the fast EMA and closes above it (index 26).
    fn pullback_window() -> Vec<Candle> {
        let mut closes: Vec<Decimal> =
            (0..20u64).map(|i| dec!(100) + Decimal::from(i)).collect();
        closes.extend([dec!(117), dec!(115), dec!(116), dec!(118), dec!(120), dec!(122)]);

        let mut candles: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c, c + dec!(0.5), c - dec!(0.5), c))
            .collect();
        candles.push(bar(26, dec!(122), dec!(122.4), dec!(120.2), dec!(122.3)));
        for (i, c) in [(27, dec!(123)), (28, dec!(124))] {
            candles.push(bar(i, c, c + dec!(0.5), c - dec!(0.5), c));
        }
        candles
    }

    fn fast_params() -> AnalysisParams {
        AnalysisParams {
            fast_ema_period: 3,
            medium_ema_period: 5,
            slow_ema_period: 8,
            macd_fast: 3,
            macd_slow: 6,
            macd_signal: 3,
            ..AnalysisParams::default()
        }
    }

    #[test]
    fn pullback_after_cross_up_fires_buy() {
        let candles = pullback_window();
        let params = fast_params();
        let set = IndicatorSet::compute(&candles, &params);
        let signals = detect_bounce_signals(&candles, &set, &params);

        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.timestamp, candles[26].close_time);
        assert_eq!(s.direction, Direction::Buy);
        assert_eq!(s.price, dec!(122.3));
        assert_eq!(s.bars_waited, 3);
        assert!(s.low <= s.tolerance_band && s.price > s.ema_fast);
        assert!(s.ema_fast > s.ema_medium && s.ema_medium > s.ema_slow);
        assert!(s.macd > s.macd_signal);
        // 25 + 20 + 20 + 15 plus a bounce-quality term a little under 20
        assert!(s.confidence > dec!(95) && s.confidence <= dec!(100));
    }

    #[test]
    fn pullback_too_late_times_out() {
        let candles = pullback_window();
        let params = AnalysisParams {
            max_wait_bars: 2,
            ..fast_params()
        };
        let set = IndicatorSet::compute(&candles, &params);
        assert!(detect_bounce_signals(&candles, &set, &params).is_empty());
    }

    #[test]
    fn short_history_yields_nothing() {
        let candles = flat(199);
        let params = AnalysisParams::default();
        let set = IndicatorSet::compute(&candles, &params);
        assert!(detect_bounce_signals(&candles, &set, &params).is_empty());
    }

    #[test]
    fn flat_history_never_fires() {
        let candles = flat(250);
        let params = AnalysisParams::default();
        let set = IndicatorSet::compute(&candles, &params);
        assert!(detect_bounce_signals(&candles, &set, &params).is_empty());
    }

    #[test]
    fn cross_on_first_full_stack_bar_fires() {
        // fast(2) 8.5 <= medium(2) 9, then at index 3 (the first bar with a
        // slow EMA) fast 10.83 > medium 10.5 > slow 9.75.
        let mut candles: Vec<Candle> = [dec!(10), dec!(9), dec!(8)]
            .into_iter()
            .enumerate()
            .map(|(i, c)| bar(i, c, c, c, c))
            .collect();
        candles.push(bar(3, dec!(10.5), dec!(12), dec!(10.5), dec!(12)));

        let params = AnalysisParams {
            fast_ema_period: 2,
            medium_ema_period: 3,
            slow_ema_period: 4,
            macd_fast: 1,
            macd_slow: 2,
            macd_signal: 2,
            ..AnalysisParams::default()
        };
        let set = IndicatorSet::compute(&candles, &params);
        let signals = detect_bounce_signals(&candles, &set, &params);

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].timestamp, candles[3].close_time);
        assert_eq!(signals[0].bars_waited, 0);
    }
}
