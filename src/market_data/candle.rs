use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single closed OHLCV candle.
///
/// Prices and volume are exact decimals so that cumulative sums (VWAP) and
/// recurrences (EMA) do not accumulate binary rounding error. Both string
/// (`"101.25"`) and numeric JSON values are accepted on input.
///
/// Sequences are expected in strictly ascending `open_time` order with no
/// duplicates; this is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Absolute size of the candle body. Saturates at `Decimal::MAX`.
    pub fn body(&self) -> Decimal {
        self.close.saturating_sub(self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_wick(&self) -> Decimal {
        self.high.saturating_sub(self.open.max(self.close))
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_wick(&self) -> Decimal {
        self.open.min(self.close).saturating_sub(self.low)
    }

    /// `(high + low + close) / 3`, or `None` if the sum overflows.
    pub fn typical_price(&self) -> Option<Decimal> {
        self.high
            .checked_add(self.low)?
            .checked_add(self.close)?
            .checked_div(dec!(3))
    }

    /// Close time as a UTC timestamp, for log lines.
    pub fn close_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.close_time).single()
    }
}
