// =============================================================================
// Shared types used across the Aurora signal engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Side of a generated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Market the analysed candles were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingType {
    Spot,
    Futures,
}

impl Default for TradingType {
    fn default() -> Self {
        Self::Spot
    }
}

impl std::fmt::Display for TradingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Futures => write!(f, "futures"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Buy).unwrap(), "\"buy\"");
        assert_eq!(Direction::Sell.to_string(), "SELL");
    }

    #[test]
    fn trading_type_defaults_to_spot() {
        assert_eq!(TradingType::default(), TradingType::Spot);
        let t: TradingType = serde_json::from_str("\"futures\"").unwrap();
        assert_eq!(t, TradingType::Futures);
    }
}
