// =============================================================================
// Futures Intelligence Module
// =============================================================================
//
// Normalizers for the two Binance Futures history endpoints:
//
//   1. Open Interest  — /futures/data/openInterestHist
//   2. Funding Rate   — /fapi/v1/fundingRate
//
// Both answer with an array of objects and both are best-effort: a payload
// that is not a non-empty array, or any row missing a required key, yields an
// empty table rather than an error.

pub mod funding_rate;
pub mod open_interest;

pub use funding_rate::{FundingRateNormalizer, FundingRatePoint};
pub use open_interest::{OpenInterestNormalizer, OpenInterestPoint};

use serde_json::Value;
use tracing::{debug, warn};

/// Map every object in `raw` through `parse_row`, or return an empty table if
/// the payload is unusable.
fn normalize_rows<T>(
    raw: &Value,
    feed: &'static str,
    parse_row: impl Fn(&Value) -> Option<T>,
) -> Vec<T> {
    let rows = match raw.as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            debug!(feed, "no rows in payload — returning empty table");
            return Vec::new();
        }
    };

    match rows.iter().map(&parse_row).collect::<Option<Vec<T>>>() {
        Some(table) => {
            debug!(feed, count = table.len(), "rows normalized");
            table
        }
        None => {
            warn!(
                feed,
                rows = rows.len(),
                "payload rows missing required keys — returning empty table"
            );
            Vec::new()
        }
    }
}
