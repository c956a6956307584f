// =============================================================================
// Aurora Signals: Technical indicator & signal engine
// =============================================================================
//
// The analysis core (`indicators`, `zones`, `signals`, `analysis`) is pure and
// synchronous.  `api`, `app_state` and `runtime_config` wrap it in a small
// HTTP service.
// =============================================================================

pub mod analysis;
pub mod api;
pub mod app_state;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod signals;
pub mod types;
pub mod zones;

pub use analysis::{
    AnalysisContext, AnalysisEngine, AnalysisRequest, AnalysisResult, TradingSignal,
};
pub use market_data::Candle;
pub use runtime_config::{AnalysisParams, RuntimeConfig};
