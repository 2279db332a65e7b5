// =============================================================================
// Feed errors
// =============================================================================
//
// Two failure kinds cross the pipeline seams:
//   Transport — network / HTTP status / body decoding / timeout / weight cap
//   Schema    — a payload that must be well-formed (candles) was not
//
// "No data" is not an error: the peripheral normalizers return empty tables.

use thiserror::Error;

use crate::types::Source;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("schema error in {feed} payload: {reason}")]
    Schema { feed: Source, reason: String },
}

impl FeedError {
    pub fn transport(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(feed: Source, reason: impl Into<String>) -> Self {
        Self::Schema {
            feed,
            reason: reason.into(),
        }
    }
}
