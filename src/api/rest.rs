// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are read-only. The presentation
// layer polls `/snapshot` on its own refresh cadence; the TTL cache decides
// whether that poll reaches Binance.
//
// CORS is configured permissively so a browser dashboard on another origin can
// read the feed.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::AppState;
use crate::binance::rate_limit::RateLimitSnapshot;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/snapshot", get(snapshot))
        .route("/api/v1/errors", get(errors))
        .route("/api/v1/config", get(config))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    symbol: String,
    uptime_secs: u64,
    rate_limit: RateLimitSnapshot,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        symbol: state.aggregator.config().symbol.clone(),
        uptime_secs: state.uptime_secs(),
        rate_limit: state.rate_limit.snapshot(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Snapshot
// =============================================================================

async fn snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.aggregator.get_snapshot().await)
}

// =============================================================================
// Diagnostics
// =============================================================================

async fn errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.aggregator.recent_errors())
}

async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.aggregator.config().clone())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::binance::rate_limit::RateLimitTracker;
    use crate::fetcher::testing::StaticFetcher;
    use crate::runtime_config::RuntimeConfig;

    fn test_state() -> Arc<AppState> {
        let fetcher = StaticFetcher::new();
        fetcher.respond(
            "/api/v3/klines",
            json!([
                [0, "100", "110", "90", "105", "10"],
                [1, "105", "115", "95", "108", "16"]
            ]),
        );
        fetcher.respond("/api/v3/depth", json!({"bids": [["100", "1"]], "asks": []}));
        fetcher.fail("/fapi/v1/fundingRate", "HTTP 418");
        // open interest left unrouted: 404

        Arc::new(AppState::new(
            RuntimeConfig::default(),
            Arc::new(fetcher),
            Arc::new(RateLimitTracker::new()),
        ))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(router(test_state()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["symbol"], "BTCUSDT");
        assert_eq!(body["rate_limit"]["spot"]["used_weight_1m"], 0);
        assert_eq!(body["rate_limit"]["spot"]["hard_limit"], 5000);
        assert_eq!(body["rate_limit"]["futures"]["hard_limit"], 2000);
    }

    #[tokio::test]
    async fn snapshot_serialises_tables() {
        let (status, body) = get_json(router(test_state()), "/api/v1/snapshot").await;
        assert_eq!(status, StatusCode::OK);

        let candles = body["candles"].as_array().unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1]["volume"], 16.0);
        assert_eq!(candles[1]["delta_volume"], 6.0);
        assert_eq!(candles[1]["cvd"], 6.0);

        assert_eq!(body["bids"][0]["price"], 100.0);
        assert_eq!(body["asks"], json!([]));
        assert_eq!(body["open_interest"], json!([]));
        assert_eq!(body["funding"], json!([]));
        assert_eq!(body["degraded_sources"], json!(["open_interest", "funding_rate"]));
    }

    #[tokio::test]
    async fn errors_lists_failures_after_snapshot() {
        let state = test_state();
        get_json(router(state.clone()), "/api/v1/snapshot").await;

        let (status, body) = get_json(router(state), "/api/v1/errors").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn config_is_exposed() {
        let (_, body) = get_json(router(test_state()), "/api/v1/config").await;
        assert_eq!(body["depth_ttl_secs"], 60);
        assert_eq!(body["candle_interval"], "1h");
    }
}
