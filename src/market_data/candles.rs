use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FeedError;
use crate::market_data::fields::{parse_epoch_ms, parse_f64};
use crate::normalize::Normalizer;
use crate::types::Source;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle from the Binance klines endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Minimum positional fields a kline row must carry (open time .. volume).
const KLINE_MIN_FIELDS: usize = 6;

const FIELD_NAMES: [&str; KLINE_MIN_FIELDS] =
    ["open time", "open", "high", "low", "close", "volume"];

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalizes the klines array-of-arrays response.
///
/// Array indices:
///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades, ...
///
/// Strict: any malformed row fails the whole table, so a broken candle feed
/// shows up upstream instead of silently plotting a gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleNormalizer;

impl Normalizer for CandleNormalizer {
    type Table = Vec<Candle>;

    fn normalize(&self, raw: &Value) -> Result<Vec<Candle>, FeedError> {
        let rows = raw
            .as_array()
            .ok_or_else(|| FeedError::schema(Source::Candles, "klines response is not an array"))?;

        let mut candles = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            candles.push(parse_kline_row(i, row)?);
        }

        debug!(count = candles.len(), "klines normalized");
        Ok(candles)
    }
}

fn parse_kline_row(index: usize, row: &Value) -> Result<Candle, FeedError> {
    let arr = row.as_array().ok_or_else(|| {
        FeedError::schema(Source::Candles, format!("kline row {index} is not an array"))
    })?;

    if arr.len() < KLINE_MIN_FIELDS {
        return Err(FeedError::schema(
            Source::Candles,
            format!(
                "kline row {index} has {} fields, expected at least {KLINE_MIN_FIELDS}",
                arr.len()
            ),
        ));
    }

    let time = parse_epoch_ms(&arr[0]).ok_or_else(|| bad_field(index, 0, &arr[0]))?;

    let mut ohlcv = [0.0; KLINE_MIN_FIELDS - 1];
    for (slot, pos) in ohlcv.iter_mut().zip(1..KLINE_MIN_FIELDS) {
        *slot = parse_f64(&arr[pos]).ok_or_else(|| bad_field(index, pos, &arr[pos]))?;
    }
    let [open, high, low, close, volume] = ohlcv;

    Ok(Candle {
        time,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn bad_field(row: usize, pos: usize, val: &Value) -> FeedError {
    FeedError::schema(
        Source::Candles,
        format!("kline row {row} field {pos} ({}) is not numeric: {val}", FIELD_NAMES[pos]),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
