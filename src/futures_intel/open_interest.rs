// =============================================================================
// Open Interest History — total outstanding contracts over time
// =============================================================================
//
// Row shape returned by /futures/data/openInterestHist:
//   { "symbol": "BTCUSDT", "sumOpenInterest": "20403.63",
//     "sumOpenInterestValue": "150570784.07", "timestamp": 1583127900000 }

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeedError;
use crate::market_data::fields::{parse_epoch_ms, parse_f64};
use crate::normalize::Normalizer;

/// Open interest at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestPoint {
    pub timestamp: DateTime<Utc>,

    /// Open interest in contracts.
    pub sum_open_interest: f64,

    /// Notional value of the open interest, when upstream reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_open_interest_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenInterestNormalizer;

impl Normalizer for OpenInterestNormalizer {
    type Table = Vec<OpenInterestPoint>;

    /// Never fails; see the module docs on degradation.
    fn normalize(&self, raw: &Value) -> Result<Vec<OpenInterestPoint>, FeedError> {
        Ok(super::normalize_rows(raw, "open_interest", |row| {
            Some(OpenInterestPoint {
                timestamp: parse_epoch_ms(row.get("timestamp")?)?,
                sum_open_interest: parse_f64(row.get("sumOpenInterest")?)?,
                sum_open_interest_value: row.get("sumOpenInterestValue").and_then(parse_f64),
            })
        }))
    }
}
