// =============================================================================
// Binance REST API Client — public market-data endpoints
// =============================================================================
//
// Only unauthenticated GETs are issued. One shared reqwest client carries the
// configured timeout; the used-weight header of every response is fed to the
// rate-limit window of the domain (spot or futures) the URL belongs to, and
// requests are refused locally once that domain's budget is spent.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::binance::rate_limit::{RateLimitTracker, WeightDomain};
use crate::error::FeedError;
use crate::fetcher::JsonFetcher;
use crate::runtime_config::RuntimeConfig;
use crate::types::Source;

/// Binance public REST client.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    rate_limit: Arc<RateLimitTracker>,
}

impl BinanceClient {
    /// Create a new `BinanceClient` whose requests time out after `timeout`.
    pub fn new(timeout: Duration, rate_limit: Arc<RateLimitTracker>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(timeout_secs = timeout.as_secs(), "BinanceClient initialised");

        Ok(Self { client, rate_limit })
    }

    #[instrument(skip(self), name = "binance::get_json")]
    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let domain = WeightDomain::for_url(url);
        if !self.rate_limit.can_send_request(domain) {
            return Err(FeedError::transport(
                url,
                format!("{domain} request weight budget exhausted"),
            ));
        }

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::transport(url, "request timed out")
            } else {
                FeedError::transport(url, e)
            }
        })?;

        self.rate_limit.update_from_headers(domain, resp.headers());

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::transport(url, format!("HTTP {status}: {body}")));
        }

        let body: Value = resp.json().await.map_err(|e| {
            FeedError::transport(url, format!("failed to parse JSON body: {e}"))
        })?;

        debug!(status = %status, "response received");
        Ok(body)
    }
}

impl JsonFetcher for BinanceClient {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FeedError>> {
        self.get_json(url).boxed()
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Endpoints
// -----------------------------------------------------------------------------

/// Full request URL for `source` under `config`.
///
///   candles        GET /api/v3/klines                    (spot)
///   open interest  GET /futures/data/openInterestHist    (futures)
///   funding rate   GET /fapi/v1/fundingRate              (futures)
///   depth          GET /api/v3/depth                     (spot)
pub fn endpoint_url(config: &RuntimeConfig, source: Source) -> String {
    let spot = config.spot_base_url.trim_end_matches('/');
    let futures = config.futures_base_url.trim_end_matches('/');
    let symbol = &config.symbol;

    match source {
        Source::Candles => format!(
            "{spot}/api/v3/klines?symbol={symbol}&interval={}&limit={}",
            config.candle_interval, config.candle_limit
        ),
        Source::OpenInterest => format!(
            "{futures}/futures/data/openInterestHist?symbol={symbol}&period={}&limit={}",
            config.open_interest_period, config.open_interest_limit
        ),
        Source::FundingRate => format!(
            "{futures}/fapi/v1/fundingRate?symbol={symbol}&limit={}",
            config.funding_limit
        ),
        Source::Depth => format!(
            "{spot}/api/v3/depth?symbol={symbol}&limit={}",
            config.depth_limit
        ),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    #[test]
    fn default_endpoints_match_binance() {
        let cfg = RuntimeConfig::default();
        assert_eq!(
            endpoint_url(&cfg, Source::Candles),
            "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1h&limit=100"
        );
        assert_eq!(
            endpoint_url(&cfg, Source::OpenInterest),
            "https://fapi.binance.com/futures/data/openInterestHist\
             ?symbol=BTCUSDT&period=5m&limit=100"
        );
        assert_eq!(
            endpoint_url(&cfg, Source::FundingRate),
            "https://fapi.binance.com/fapi/v1/fundingRate?symbol=BTCUSDT&limit=100"
        );
        assert_eq!(
            endpoint_url(&cfg, Source::Depth),
            "https://api.binance.com/api/v3/depth?symbol=BTCUSDT&limit=100"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let cfg = RuntimeConfig {
            spot_base_url: "http://localhost:9000/".into(),
            symbol: "ETHUSDT".into(),
            ..RuntimeConfig::default()
        };
        assert_eq!(
            endpoint_url(&cfg, Source::Depth),
            "http://localhost:9000/api/v3/depth?symbol=ETHUSDT&limit=100"
        );
    }

    // -------------------------------------------------------------------------
    // Live requests against a local axum server
    // -------------------------------------------------------------------------

    fn weight_header(weight: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-MBX-USED-WEIGHT-1M", weight.parse().unwrap());
        headers
    }

    /// Serve a fake Binance on an ephemeral port and return its base URL.
    async fn serve_local() -> String {
        let app = Router::new()
            .route(
                "/fail",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/bad", get(|| async { "this is not json" }))
            .route(
                "/api/v3/depth",
                get(|| async { (weight_header("12"), Json(json!({"bids": []}))) }),
            )
            .route(
                "/api/v3/klines",
                get(|| async { (weight_header("5000"), Json(json!([]))) }),
            )
            .route(
                "/fapi/v1/fundingRate",
                get(|| async { (weight_header("7"), Json(json!([]))) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn local_client(tracker: Arc<RateLimitTracker>) -> BinanceClient {
        BinanceClient::new(Duration::from_secs(5), tracker).unwrap()
    }

    fn transport_reason(err: FeedError) -> String {
        match err {
            FeedError::Transport { reason, .. } => reason,
            other => panic!("expected a transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_is_transport_with_body() {
        let base = serve_local().await;
        let client = local_client(Arc::new(RateLimitTracker::new()));

        let err = client.fetch(&format!("{base}/fail")).await.unwrap_err();
        assert_eq!(transport_reason(err), "HTTP 500 Internal Server Error: boom");
    }

    #[tokio::test]
    async fn non_json_body_is_transport() {
        let base = serve_local().await;
        let client = local_client(Arc::new(RateLimitTracker::new()));

        let err = client.fetch(&format!("{base}/bad")).await.unwrap_err();
        assert!(transport_reason(err).starts_with("failed to parse JSON body: "));
    }

    #[tokio::test]
    async fn success_returns_body_and_records_weight() {
        let base = serve_local().await;
        let tracker = Arc::new(RateLimitTracker::new());
        let client = local_client(tracker.clone());

        let body = client
            .fetch(&format!("{base}/api/v3/depth?symbol=BTCUSDT&limit=5"))
            .await
            .unwrap();
        assert_eq!(body, json!({"bids": []}));
        assert_eq!(tracker.used_weight(WeightDomain::Spot), 12);
        assert_eq!(tracker.used_weight(WeightDomain::Futures), 0);
    }

    #[tokio::test]
    async fn spent_spot_budget_still_allows_futures_requests() {
        let base = serve_local().await;
        let tracker = Arc::new(RateLimitTracker::new());
        let client = local_client(tracker.clone());

        client.fetch(&format!("{base}/api/v3/klines")).await.unwrap();
        assert!(!tracker.can_send_request(WeightDomain::Spot));

        let spot = client.fetch(&format!("{base}/api/v3/depth")).await.unwrap_err();
        assert!(transport_reason(spot).contains("spot request weight budget exhausted"));

        let futures = client.fetch(&format!("{base}/fapi/v1/fundingRate")).await;
        assert_eq!(futures, Ok(json!([])));
        assert_eq!(tracker.used_weight(WeightDomain::Futures), 7);
    }

    #[tokio::test]
    async fn exhausted_budget_refuses_without_sending() {
        let tracker = Arc::new(RateLimitTracker::new());
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "X-MBX-USED-WEIGHT-1M",
            reqwest::header::HeaderValue::from_static("100000"),
        );
        tracker.update_from_headers(WeightDomain::Futures, &headers);

        let client = BinanceClient::new(Duration::from_secs(1), tracker).unwrap();
        // Unroutable address: the request would fail differently if sent.
        let err = client
            .fetch("http://127.0.0.1:9/fapi/v1/fundingRate")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("budget exhausted"));
    }
}
