// =============================================================================
// Runtime Configuration: Analysis defaults and service settings
// =============================================================================
//
// Every tunable parameter of the signal engine lives here.  The analysis
// parameters are pass-through values: each request may carry its own set,
// falling back to the block stored in the runtime config.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_fast_ema_period() -> usize {
    9
}

fn default_medium_ema_period() -> usize {
    20
}

fn default_slow_ema_period() -> usize {
    200
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bounce_tolerance_pct() -> Decimal {
    dec!(0.05)
}

fn default_max_wait_bars() -> u32 {
    30
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_exchange() -> String {
    "binance".to_string()
}

// =============================================================================
// AnalysisParams
// =============================================================================

/// Periods and thresholds for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Fast EMA period (pullback target).
    #[serde(default = "default_fast_ema_period")]
    pub fast_ema_period: usize,

    #[serde(default = "default_medium_ema_period")]
    pub medium_ema_period: usize,

    /// Slow EMA period. Also the minimum history for bounce detection.
    #[serde(default = "default_slow_ema_period")]
    pub slow_ema_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// How far above the fast EMA a low may sit and still count as a touch,
    /// in percent (0.05 means 0.05 %).
    #[serde(default = "default_bounce_tolerance_pct")]
    pub bounce_tolerance_pct: Decimal,

    /// Bars to wait for a pullback after a cross-up. 0 waits indefinitely.
    #[serde(default = "default_max_wait_bars")]
    pub max_wait_bars: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            fast_ema_period: default_fast_ema_period(),
            medium_ema_period: default_medium_ema_period(),
            slow_ema_period: default_slow_ema_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bounce_tolerance_pct: default_bounce_tolerance_pct(),
            max_wait_bars: default_max_wait_bars(),
        }
    }
}

impl AnalysisParams {
    /// Problems that make the parameter set meaningless.
    ///
    /// The engine itself never rejects parameters (degenerate periods simply
    /// produce empty series); this is for callers that want to refuse them up
    /// front.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (name, value) in [
            ("fast_ema_period", self.fast_ema_period),
            ("medium_ema_period", self.medium_ema_period),
            ("slow_ema_period", self.slow_ema_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ] {
            if value == 0 {
                problems.push(format!("{name} must be greater than zero"));
            }
        }

        if !(self.fast_ema_period < self.medium_ema_period
            && self.medium_ema_period < self.slow_ema_period)
        {
            problems.push(format!(
                "EMA periods must be strictly increasing (got {}/{}/{})",
                self.fast_ema_period, self.medium_ema_period, self.slow_ema_period
            ));
        }

        if self.macd_fast > self.macd_slow {
            problems.push(format!(
                "macd_fast ({}) must not exceed macd_slow ({})",
                self.macd_fast, self.macd_slow
            ));
        }

        if self.bounce_tolerance_pct.is_sign_negative() {
            problems.push("bounce_tolerance_pct must not be negative".to_string());
        }

        problems
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the Aurora signal service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Socket address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Exchange assumed when a request does not name one.
    #[serde(default = "default_exchange")]
    pub default_exchange: String,

    /// Analysis parameters used when a request carries none.
    #[serde(default)]
    pub analysis: AnalysisParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            default_exchange: default_exchange(),
            analysis: AnalysisParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            listen_addr = %config.listen_addr,
            slow_ema = config.analysis.slow_ema_period,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
