// =============================================================================
// Runtime Configuration — feed settings loaded from JSON
// =============================================================================
//
// Every tunable parameter of the dashboard feed lives here: the instrument,
// the upstream endpoints and their fixed windows, per-source freshness, the
// fetch timeout and the HTTP bind address.
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.
//
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Source;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_spot_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_futures_base_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_candle_interval() -> String {
    "1h".to_string()
}

fn default_open_interest_period() -> String {
    "5m".to_string()
}

fn default_limit() -> u32 {
    100
}

fn default_slow_ttl_secs() -> u64 {
    300
}

fn default_depth_ttl_secs() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the feed.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Instrument & upstream ----------------------------------------------

    /// The single instrument all four sources are queried for.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_spot_base_url")]
    pub spot_base_url: String,

    #[serde(default = "default_futures_base_url")]
    pub futures_base_url: String,

    // --- Fixed windows -------------------------------------------------------

    /// Kline interval, e.g. "1h".
    #[serde(default = "default_candle_interval")]
    pub candle_interval: String,

    #[serde(default = "default_limit")]
    pub candle_limit: u32,

    /// Open-interest history period, e.g. "5m".
    #[serde(default = "default_open_interest_period")]
    pub open_interest_period: String,

    #[serde(default = "default_limit")]
    pub open_interest_limit: u32,

    #[serde(default = "default_limit")]
    pub funding_limit: u32,

    /// Levels per side of the depth snapshot.
    #[serde(default = "default_limit")]
    pub depth_limit: u32,

    // --- Freshness -----------------------------------------------------------

    #[serde(default = "default_slow_ttl_secs")]
    pub candles_ttl_secs: u64,

    #[serde(default = "default_slow_ttl_secs")]
    pub open_interest_ttl_secs: u64,

    #[serde(default = "default_slow_ttl_secs")]
    pub funding_ttl_secs: u64,

    /// Order-book depth is the most time-sensitive source.
    #[serde(default = "default_depth_ttl_secs")]
    pub depth_ttl_secs: u64,

    /// Upper bound on a single upstream fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// When a refresh fails, serve the last good table instead of an empty one.
    #[serde(default)]
    pub serve_stale_on_error: bool,

    // --- API -----------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            spot_base_url: default_spot_base_url(),
            futures_base_url: default_futures_base_url(),
            candle_interval: default_candle_interval(),
            candle_limit: default_limit(),
            open_interest_period: default_open_interest_period(),
            open_interest_limit: default_limit(),
            funding_limit: default_limit(),
            depth_limit: default_limit(),
            candles_ttl_secs: default_slow_ttl_secs(),
            open_interest_ttl_secs: default_slow_ttl_secs(),
            funding_ttl_secs: default_slow_ttl_secs(),
            depth_ttl_secs: default_depth_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            serve_stale_on_error: false,
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// How long a freshly produced table for `source` stays fresh.
    pub fn ttl_for(&self, source: Source) -> Duration {
        let secs = match source {
            Source::Candles => self.candles_ttl_secs,
            Source::OpenInterest => self.open_interest_ttl_secs,
            Source::FundingRate => self.funding_ttl_secs,
            Source::Depth => self.depth_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
