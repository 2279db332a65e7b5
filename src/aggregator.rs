// =============================================================================
// Aggregator — four cached pipelines, one snapshot
// =============================================================================
//
// Pipelines (independent, run concurrently):
//
//   candles        fetch → CandleNormalizer → derive_cvd → cache (300 s)
//   open interest  fetch → OpenInterestNormalizer        → cache (300 s)
//   funding rate   fetch → FundingRateNormalizer         → cache (300 s)
//   depth          fetch → DepthNormalizer               → cache (60 s)
//
// A failing pipeline never fails the snapshot: its table is empty (or the
// last good table when `serve_stale_on_error` is set) and the source is
// listed in `degraded_sources`.
// =============================================================================

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::binance::client::endpoint_url;
use crate::cache::TtlCache;
use crate::error::FeedError;
use crate::fetcher::JsonFetcher;
use crate::futures_intel::{
    FundingRateNormalizer, FundingRatePoint, OpenInterestNormalizer, OpenInterestPoint,
};
use crate::indicators::{derive_cvd, CvdCandle};
use crate::market_data::{CandleNormalizer, DepthNormalizer, DepthTable, OrderBookLevel};
use crate::normalize::Normalizer;
use crate::runtime_config::RuntimeConfig;
use crate::types::Source;

/// Maximum number of recent pipeline errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// Tables & snapshot
// =============================================================================

/// The cached output of one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceTable {
    Candles(Vec<CvdCandle>),
    OpenInterest(Vec<OpenInterestPoint>),
    FundingRate(Vec<FundingRatePoint>),
    Depth(DepthTable),
}

/// Everything the presentation layer renders. Sub-tables are empty, never
/// missing, when their source had nothing to offer.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub candles: Vec<CvdCandle>,
    pub open_interest: Vec<OpenInterestPoint>,
    pub funding: Vec<FundingRatePoint>,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    /// Sources whose pipeline failed while building this snapshot.
    pub degraded_sources: Vec<Source>,
}

/// A recorded pipeline failure for the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub source: Source,
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// Aggregator
// =============================================================================

pub struct Aggregator {
    fetcher: Arc<dyn JsonFetcher>,
    cache: Arc<TtlCache<Source, SourceTable>>,
    config: RuntimeConfig,
    recent_errors: RwLock<VecDeque<ErrorRecord>>,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        cache: Arc<TtlCache<Source, SourceTable>>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            config,
            recent_errors: RwLock::new(VecDeque::with_capacity(MAX_RECENT_ERRORS)),
        }
    }

    /// Build a snapshot from the four cached pipelines.
    #[instrument(skip(self), fields(symbol = %self.config.symbol))]
    pub async fn get_snapshot(&self) -> Snapshot {
        let (candles, open_interest, funding, depth) = tokio::join!(
            self.table(Source::Candles),
            self.table(Source::OpenInterest),
            self.table(Source::FundingRate),
            self.table(Source::Depth),
        );

        let mut degraded = Vec::new();

        let candles = match self.settle(Source::Candles, candles, &mut degraded) {
            Some(SourceTable::Candles(rows)) => rows,
            _ => Vec::new(),
        };
        let open_interest = match self.settle(Source::OpenInterest, open_interest, &mut degraded) {
            Some(SourceTable::OpenInterest(rows)) => rows,
            _ => Vec::new(),
        };
        let funding = match self.settle(Source::FundingRate, funding, &mut degraded) {
            Some(SourceTable::FundingRate(rows)) => rows,
            _ => Vec::new(),
        };
        let DepthTable { bids, asks } = match self.settle(Source::Depth, depth, &mut degraded) {
            Some(SourceTable::Depth(book)) => book,
            _ => DepthTable::default(),
        };

        debug!(
            candles = candles.len(),
            open_interest = open_interest.len(),
            funding = funding.len(),
            bids = bids.len(),
            asks = asks.len(),
            degraded = degraded.len(),
            "snapshot assembled"
        );

        Snapshot {
            symbol: self.config.symbol.clone(),
            generated_at: Utc::now(),
            candles,
            open_interest,
            funding,
            bids,
            asks,
            degraded_sources: degraded,
        }
    }

    /// Most recent pipeline failures, oldest first.
    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().iter().cloned().collect()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Pipeline stages
    // -------------------------------------------------------------------------

    async fn table(&self, source: Source) -> Result<SourceTable, FeedError> {
        let ttl = self.config.ttl_for(source);
        self.cache
            .get_or_compute(source, ttl, || self.produce(source))
            .await
    }

    async fn produce(&self, source: Source) -> Result<SourceTable, FeedError> {
        let url = endpoint_url(&self.config, source);
        let raw = self.fetch_raw(&url).await?;

        let table = match source {
            Source::Candles => {
                SourceTable::Candles(derive_cvd(&CandleNormalizer.normalize(&raw)?))
            }
            Source::OpenInterest => {
                SourceTable::OpenInterest(OpenInterestNormalizer.normalize(&raw)?)
            }
            Source::FundingRate => SourceTable::FundingRate(FundingRateNormalizer.normalize(&raw)?),
            Source::Depth => SourceTable::Depth(DepthNormalizer.normalize(&raw)?),
        };

        debug!(source = %source, "table refreshed");
        Ok(table)
    }

    async fn fetch_raw(&self, url: &str) -> Result<Value, FeedError> {
        let timeout = self.config.fetch_timeout();
        match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::transport(
                url,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        }
    }

    /// Turn a pipeline result into the table to publish, recording failures.
    fn settle(
        &self,
        source: Source,
        result: Result<SourceTable, FeedError>,
        degraded: &mut Vec<Source>,
    ) -> Option<SourceTable> {
        let err = match result {
            Ok(table) => return Some(table),
            Err(e) => e,
        };

        degraded.push(source);
        self.push_error(source, &err);

        if self.config.serve_stale_on_error {
            let stale = self.cache.peek(&source);
            warn!(
                source = %source,
                error = %err,
                has_stale = stale.is_some(),
                "pipeline failed — serving last good table"
            );
            stale
        } else {
            warn!(source = %source, error = %err, "pipeline failed — serving empty table");
            None
        }
    }

    fn push_error(&self, source: Source, err: &FeedError) {
        let mut errors = self.recent_errors.write();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.pop_front();
        }
        errors.push_back(ErrorRecord {
            source,
            message: err.to_string(),
            at: Utc::now().to_rfc3339(),
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
