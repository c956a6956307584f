// =============================================================================
// Market Data Module
// =============================================================================
//
// Candle records handed to the engine by the market-data collaborator.
// Acquisition (REST polling, websocket streams, retries) happens outside
// this crate; the engine only consumes fully materialised windows.

pub mod candle;

pub use candle::Candle;
