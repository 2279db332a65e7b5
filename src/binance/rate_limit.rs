// =============================================================================
// Rate-Limit Tracker — monitors Binance request weight to avoid 429s
// =============================================================================
//
// Binance caps request weight per IP per minute, separately for each API:
//   - Spot    (api.binance.com):  6000 — we hard-cap ourselves at 5000.
//   - Futures (fapi.binance.com): 2400 — we hard-cap ourselves at 2000.
//
// The tracker reads the `X-MBX-USED-WEIGHT-1M` response header after every
// request into the window of the domain that answered, and keeps atomic
// counters that any task may query lock-free. A reading older than one minute
// belongs to a lapsed window and counts as zero.
// =============================================================================

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Length of the Binance weight window.
const WINDOW_MS: i64 = 60_000;

/// Which Binance weight budget a request is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightDomain {
    Spot,
    Futures,
}

impl WeightDomain {
    /// Classify a request URL by its path: `/fapi/...` and `/futures/data/...`
    /// are futures endpoints, everything else is spot.
    pub fn for_url(url: &str) -> Self {
        let path = reqwest::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        if path.starts_with("/fapi/") || path.starts_with("/futures/") {
            Self::Futures
        } else {
            Self::Spot
        }
    }

    /// Hard ceiling at which we refuse to send additional requests.
    pub fn hard_limit(self) -> u32 {
        match self {
            Self::Spot => 5000,
            Self::Futures => 2000,
        }
    }

    /// Soft warning threshold (80% of the hard limit).
    fn warn_threshold(self) -> u32 {
        self.hard_limit() / 5 * 4
    }
}

impl std::fmt::Display for WeightDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Futures => write!(f, "futures"),
        }
    }
}

/// Last weight reading for one domain.
struct WeightWindow {
    used_weight_1m: AtomicU32,
    /// Epoch ms of the header reading behind `used_weight_1m`.
    observed_at_ms: AtomicI64,
}

impl WeightWindow {
    fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
            observed_at_ms: AtomicI64::new(0),
        }
    }

    fn used_at(&self, now_ms: i64) -> u32 {
        let observed = self.observed_at_ms.load(Ordering::Relaxed);
        if now_ms - observed >= WINDOW_MS {
            0
        } else {
            self.used_weight_1m.load(Ordering::Relaxed)
        }
    }

    fn record(&self, weight: u32, now_ms: i64) {
        self.used_weight_1m.store(weight, Ordering::Relaxed);
        self.observed_at_ms.store(now_ms, Ordering::Relaxed);
    }
}

/// Thread-safe request-weight tracker with one window per domain.
pub struct RateLimitTracker {
    spot: WeightWindow,
    futures: WeightWindow,
}

/// Per-domain usage inside a [`RateLimitSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainWeight {
    pub used_weight_1m: u32,
    pub hard_limit: u32,
}

/// Immutable snapshot of the current rate-limit state (suitable for
/// serialisation into a health payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub spot: DomainWeight,
    pub futures: DomainWeight,
}

impl RateLimitTracker {
    /// Create a new tracker with every counter at zero.
    pub fn new() -> Self {
        Self {
            spot: WeightWindow::new(),
            futures: WeightWindow::new(),
        }
    }

    fn window(&self, domain: WeightDomain) -> &WeightWindow {
        match domain {
            WeightDomain::Spot => &self.spot,
            WeightDomain::Futures => &self.futures,
        }
    }

    // -------------------------------------------------------------------------
    // Header-based updates
    // -------------------------------------------------------------------------

    /// Update `domain`'s counter from the Binance response headers.
    pub fn update_from_headers(&self, domain: WeightDomain, headers: &reqwest::header::HeaderMap) {
        self.update_from_headers_at(domain, headers, Utc::now().timestamp_millis());
    }

    fn update_from_headers_at(
        &self,
        domain: WeightDomain,
        headers: &reqwest::header::HeaderMap,
        now_ms: i64,
    ) {
        let Some(w) = headers
            .get("X-MBX-USED-WEIGHT-1M")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };

        let window = self.window(domain);
        let prev = window.used_at(now_ms);
        window.record(w, now_ms);

        let threshold = domain.warn_threshold();
        if w >= threshold && prev < threshold {
            warn!(
                domain = %domain,
                used_weight = w,
                hard_limit = domain.hard_limit(),
                "rate-limit weight crossed warning threshold"
            );
        }
        debug!(domain = %domain, used_weight_1m = w, "rate-limit weight updated from header");
    }

    // -------------------------------------------------------------------------
    // Pre-flight checks
    // -------------------------------------------------------------------------

    /// Weight used in `domain`'s current one-minute window.
    pub fn used_weight(&self, domain: WeightDomain) -> u32 {
        self.window(domain).used_at(Utc::now().timestamp_millis())
    }

    /// Return `true` while `domain` has not reached its hard limit.
    pub fn can_send_request(&self, domain: WeightDomain) -> bool {
        self.can_send_request_at(domain, Utc::now().timestamp_millis())
    }

    fn can_send_request_at(&self, domain: WeightDomain, now_ms: i64) -> bool {
        let current = self.window(domain).used_at(now_ms);
        let allowed = current < domain.hard_limit();
        if !allowed {
            warn!(
                domain = %domain,
                current_weight = current,
                hard_limit = domain.hard_limit(),
                "request blocked — would exceed rate-limit"
            );
        }
        allowed
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    /// Produce a serialisable snapshot of both counters.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        let domain_weight = |domain: WeightDomain| DomainWeight {
            used_weight_1m: self.used_weight(domain),
            hard_limit: domain.hard_limit(),
        };
        RateLimitSnapshot {
            spot: domain_weight(WeightDomain::Spot),
            futures: domain_weight(WeightDomain::Futures),
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("spot_weight_1m", &self.spot.used_weight_1m.load(Ordering::Relaxed))
            .field("futures_weight_1m", &self.futures.used_weight_1m.load(Ordering::Relaxed))
            .finish()
    }
}
