// =============================================================================
// Macro Dashboard Feed — Main Entry Point
// =============================================================================
//
// Serves a cached, normalized snapshot of candles (+ CVD), open interest,
// funding rate and order-book depth for one instrument. Upstream is only hit
// when a source's TTL has lapsed.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod aggregator;
mod api;
mod app_state;
mod binance;
mod cache;
mod error;
mod fetcher;
mod futures_intel;
mod indicators;
mod market_data;
mod normalize;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::binance::{BinanceClient, RateLimitTracker};
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard_config.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override from env if available.
    if let Ok(symbol) = std::env::var("DASHBOARD_SYMBOL") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            config.symbol = symbol;
        }
    }
    if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
        config.bind_addr = addr;
    }

    info!(
        symbol = %config.symbol,
        candles_ttl_secs = config.candles_ttl_secs,
        depth_ttl_secs = config.depth_ttl_secs,
        fetch_timeout_secs = config.fetch_timeout_secs,
        "Dashboard feed starting"
    );

    // ── 2. Upstream client ───────────────────────────────────────────────
    let rate_limit = Arc::new(RateLimitTracker::new());
    let client = BinanceClient::new(config.fetch_timeout(), rate_limit.clone())?;

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(client), rate_limit));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Dashboard feed shut down complete.");
    Ok(())
}
