// =============================================================================
// Fetcher — one GET, one parsed JSON document
// =============================================================================

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::FeedError;

/// Fetches a URL and returns its body parsed as JSON.
///
/// Implementations fail with [`FeedError::Transport`] on network errors,
/// non-2xx statuses and undecodable bodies. They never retry.
pub trait JsonFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FeedError>>;
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------
