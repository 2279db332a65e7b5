// =============================================================================
// Central Application State — Dashboard Feed
// =============================================================================
//
// Built once at process start and shared with every request handler via
// `Arc<AppState>`. The TTL cache lives inside the aggregator for the whole
// process lifetime; nothing here needs explicit teardown.
// =============================================================================

use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::binance::rate_limit::RateLimitTracker;
use crate::cache::TtlCache;
use crate::fetcher::JsonFetcher;
use crate::runtime_config::RuntimeConfig;

/// Central application state shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    pub aggregator: Aggregator,
    pub rate_limit: Arc<RateLimitTracker>,

    /// Instant when the feed was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire the aggregator to `fetcher` with a fresh process-wide cache.
    pub fn new(
        config: RuntimeConfig,
        fetcher: Arc<dyn JsonFetcher>,
        rate_limit: Arc<RateLimitTracker>,
    ) -> Self {
        let cache = Arc::new(TtlCache::new());
        Self {
            aggregator: Aggregator::new(fetcher, cache, config),
            rate_limit,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
