// =============================================================================
// Normalizer — one interface over the four upstream payload shapes
// =============================================================================
//
//   Candles        array of positional arrays        → Vec<Candle>      (strict)
//   OpenInterest   array of objects                   → Vec<OI point>    (degrades)
//   FundingRate    array of objects                   → Vec<Funding pt>  (degrades)
//   Depth          {bids: [[p, q]], asks: [[p, q]]}   → DepthTable       (degrades)
//
// Only the candle normalizer can fail. The other three report a payload they
// cannot use as an empty table.

use serde_json::Value;

use crate::error::FeedError;

/// Turns one source's raw JSON into its typed table.
pub trait Normalizer {
    type Table;

    fn normalize(&self, raw: &Value) -> Result<Self::Table, FeedError>;
}
