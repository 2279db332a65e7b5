// =============================================================================
// Funding Rate History — periodic payments between longs and shorts
// =============================================================================
//
// Funding rates anchor the perpetual contract price to spot. Row shape from
// /fapi/v1/fundingRate:
//   { "symbol": "BTCUSDT", "fundingRate": "0.00010000",
//     "fundingTime": 1698768000000, "markPrice": "34287.54619963" }
//
// Older records carry `"markPrice": ""`, which is treated as absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeedError;
use crate::market_data::fields::{parse_epoch_ms, parse_f64};
use crate::normalize::Normalizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRatePoint {
    pub funding_time: DateTime<Utc>,

    /// Raw funding rate as a decimal (e.g. 0.0001 = 0.01%).
    pub funding_rate: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FundingRateNormalizer;

impl Normalizer for FundingRateNormalizer {
    type Table = Vec<FundingRatePoint>;

    fn normalize(&self, raw: &Value) -> Result<Vec<FundingRatePoint>, FeedError> {
        Ok(super::normalize_rows(raw, "funding_rate", |row| {
            Some(FundingRatePoint {
                funding_time: parse_epoch_ms(row.get("fundingTime")?)?,
                funding_rate: parse_f64(row.get("fundingRate")?)?,
                mark_price: row.get("markPrice").and_then(parse_f64),
            })
        }))
    }
}
