// =============================================================================
// Order Book Depth — REST depth snapshot normalization
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::market_data::fields::parse_f64;
use crate::normalize::Normalizer;

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Both sides of the book, each in the order upstream returned it
/// (bids descending, asks ascending by Binance convention; not enforced).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthTable {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

/// Normalizes a depth snapshot.
///
/// Expected shape:
/// ```json
/// {
///   "lastUpdateId": 12345,
///   "bids": [["37000.00", "1.5"], ...],
///   "asks": [["37001.00", "1.2"], ...]
/// }
/// ```
///
/// If either side is missing or any level is malformed, both sides come back
/// empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthNormalizer;

impl Normalizer for DepthNormalizer {
    type Table = DepthTable;

    fn normalize(&self, raw: &Value) -> Result<DepthTable, FeedError> {
        let (Some(bids), Some(asks)) = (raw.get("bids"), raw.get("asks")) else {
            warn!("depth payload missing bids or asks — returning empty book");
            return Ok(DepthTable::default());
        };

        let table = match (parse_side(bids), parse_side(asks)) {
            (Some(bids), Some(asks)) => DepthTable { bids, asks },
            _ => {
                warn!("depth payload has malformed levels — returning empty book");
                return Ok(DepthTable::default());
            }
        };

        debug!(
            bids = table.bids.len(),
            asks = table.asks.len(),
            "depth normalized"
        );
        Ok(table)
    }
}

fn parse_side(side: &Value) -> Option<Vec<OrderBookLevel>> {
    side.as_array()?
        .iter()
        .map(|level| {
            Some(OrderBookLevel {
                price: parse_f64(level.get(0)?)?,
                quantity: parse_f64(level.get(1)?)?,
            })
        })
        .collect()
}
