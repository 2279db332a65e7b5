pub mod candles;
pub mod fields;
pub mod orderbook;

// Re-export the table types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candles::{Candle, CandleNormalizer};
pub use orderbook::{DepthNormalizer, DepthTable, OrderBookLevel};
