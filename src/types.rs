// =============================================================================
// Shared types used across the dashboard feed
// =============================================================================

use serde::{Deserialize, Serialize};

/// One of the four upstream market-data sources polled for the instrument.
///
/// The set is closed: every pipeline, cache key and TTL lookup dispatches on
/// this enum rather than inspecting payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Candles,
    OpenInterest,
    FundingRate,
    Depth,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Candles => write!(f, "candles"),
            Self::OpenInterest => write!(f, "open_interest"),
            Self::FundingRate => write!(f, "funding_rate"),
            Self::Depth => write!(f, "depth"),
        }
    }
}
