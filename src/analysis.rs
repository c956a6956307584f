// =============================================================================
// Analysis Engine: One call, every indicator and signal
// =============================================================================
//
// Turns a fully materialised candle window into the complete result bundle.
//
// Pipeline:
//   1. Compute indicators once (EMA stack, VWAP, MACD)
//   2. Detect and consolidate supply/demand zones
//   3. Run the EMA bounce detector
//   4. Match recent candles against zones
//   5. Merge both signal lists chronologically and attach identity
//
// Pure and synchronous: no I/O, no shared state, so independent symbols can be
// analysed in parallel.  Signals from different strategies are never
// reconciled against each other.
// =============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::{EmaPoint, IndicatorSet, MacdPoint, VwapPoint};
use crate::market_data::Candle;
use crate::runtime_config::{AnalysisParams, RuntimeConfig};
use crate::signals::{detect_bounce_signals, detect_zone_signals, BounceSignal, Signal, ZoneSignal};
use crate::types::{Direction, TradingType};
use crate::zones::{detect_zones, Zone};

// =============================================================================
// Context & output types
// =============================================================================

/// Identifiers the caller attaches to a candle window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub symbol: String,
    pub exchange: String,
    #[serde(default)]
    pub trading_type: TradingType,
    pub timeframe: String,
}

/// An analysis request as received over HTTP or read from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub trading_type: TradingType,
    pub timeframe: String,
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub params: Option<AnalysisParams>,
}

impl AnalysisRequest {
    /// Fill missing fields from `defaults` and validate.
    ///
    /// Returns every problem found rather than stopping at the first.
    pub fn resolve(
        self,
        defaults: &RuntimeConfig,
    ) -> Result<(Vec<Candle>, AnalysisContext, AnalysisParams), Vec<String>> {
        let params = self.params.unwrap_or_else(|| defaults.analysis.clone());
        let mut problems = params.validate();
        if self.symbol.trim().is_empty() {
            problems.push("symbol must not be empty".to_string());
        }
        if self.timeframe.trim().is_empty() {
            problems.push("timeframe must not be empty".to_string());
        }
        if !problems.is_empty() {
            return Err(problems);
        }

        let ctx = AnalysisContext {
            symbol: self.symbol,
            exchange: self
                .exchange
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| defaults.default_exchange.clone()),
            trading_type: self.trading_type,
            timeframe: self.timeframe,
        };
        Ok((self.candles, ctx, params))
    }
}

/// A strategy signal plus the identity of the market it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    /// `{strategy}_{timestamp}`. Not unique across symbols, nor across zones
    /// touched by the same candle; see [`TradingSignal::composite_key`].
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub trading_type: TradingType,
    pub timeframe: String,
    pub is_active: bool,
    pub signal: Signal,
}

impl TradingSignal {
    fn new(signal: Signal, ctx: &AnalysisContext) -> Self {
        Self {
            id: format!("{}_{}", signal.strategy_tag(), signal.timestamp()),
            symbol: ctx.symbol.clone(),
            exchange: ctx.exchange.clone(),
            trading_type: ctx.trading_type,
            timeframe: ctx.timeframe.clone(),
            is_active: true,
            signal,
        }
    }

    /// `symbol:exchange:timeframe:strategy:timestamp`, for consumers that
    /// need identity across symbols and timeframes.
    pub fn composite_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.symbol,
            self.exchange,
            self.timeframe,
            self.signal.strategy_tag(),
            self.signal.timestamp()
        )
    }
}

/// Headline counts for logs and API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub candles: usize,
    pub zones: usize,
    pub bounce_signals: usize,
    pub zone_signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub last_close: Option<Decimal>,
}

/// Everything one analysis call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ema_series: Vec<EmaPoint>,
    pub vwap_series: Vec<VwapPoint>,
    pub macd_series: Vec<MacdPoint>,
    pub zones: Vec<Zone>,
    pub bounce_signals: Vec<BounceSignal>,
    pub zone_signals: Vec<ZoneSignal>,
    pub all_signals: Vec<TradingSignal>,
    pub summary: AnalysisSummary,
}

// =============================================================================
// Analysis Engine
// =============================================================================

pub struct AnalysisEngine;

impl AnalysisEngine {
    /// Analyse one candle window.
    ///
    /// Insufficient history never fails: fewer than 10 candles gives no zones,
    /// fewer than `slow_ema_period` gives no bounce signals and no EMA points.
    pub fn analyze(
        candles: &[Candle],
        ctx: &AnalysisContext,
        params: &AnalysisParams,
    ) -> AnalysisResult {
        // ── 1. Indicators ───────────────────────────────────────────────
        let indicators = IndicatorSet::compute(candles, params);

        // ── 2. Zones ────────────────────────────────────────────────────
        let zones = detect_zones(candles);

        // ── 3. Bounce signals ───────────────────────────────────────────
        let bounce_signals = detect_bounce_signals(candles, &indicators, params);

        // ── 4. Zone signals ─────────────────────────────────────────────
        let zone_signals = detect_zone_signals(candles, &zones);

        // ── 5. Merge ────────────────────────────────────────────────────
        let mut all_signals: Vec<TradingSignal> = bounce_signals
            .iter()
            .cloned()
            .map(Signal::from)
            .chain(zone_signals.iter().cloned().map(Signal::from))
            .map(|signal| TradingSignal::new(signal, ctx))
            .collect();
        all_signals.sort_by_key(|s| s.signal.timestamp());

        let buy_signals = all_signals
            .iter()
            .filter(|s| s.signal.direction() == Direction::Buy)
            .count();

        let summary = AnalysisSummary {
            candles: candles.len(),
            zones: zones.len(),
            bounce_signals: bounce_signals.len(),
            zone_signals: zone_signals.len(),
            buy_signals,
            sell_signals: all_signals.len() - buy_signals,
            last_close: candles.last().map(|c| c.close),
        };

        info!(
            symbol = %ctx.symbol,
            exchange = %ctx.exchange,
            timeframe = %ctx.timeframe,
            candles = summary.candles,
            zones = summary.zones,
            bounce_signals = summary.bounce_signals,
            zone_signals = summary.zone_signals,
            last_candle = ?candles.last().and_then(Candle::close_datetime),
            "analysis complete"
        );

        AnalysisResult {
            ema_series: indicators.ema_points(candles),
            vwap_series: indicators.vwap.clone(),
            macd_series: indicators.macd_points(candles),
            zones,
            bounce_signals,
            zone_signals,
            all_signals,
            summary,
        }
    }
}
