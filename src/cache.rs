// =============================================================================
// TTL Cache — process-wide memoization of pipeline results
// =============================================================================
//
// Each key maps to an `Arc<CacheEntry>` that is swapped whole under a
// parking_lot::RwLock, so readers only ever see a complete entry.
//
// The lock is never held across the producer's `.await`. Two cold callers for
// the same key may therefore both run the producer; the last writer wins.
// There is no single-flight guard.
//
// Time comes from `tokio::time::Instant`, which tests can pause and advance.
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

/// A produced value together with when it was produced and how long it lives.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub produced_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            produced_at: Instant::now(),
            ttl,
        }
    }

    /// Live strictly before `produced_at + ttl`.
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.produced_at) < self.ttl
    }
}

/// Keyed cache whose entries expire `ttl` after they were produced.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Arc<CacheEntry<V>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the live value for `key`, or run `producer` and store its
    /// result for `ttl`.
    ///
    /// A producer error is returned as-is and any existing entry, stale or
    /// not, is left in place.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_live(&key) {
            return Ok(value);
        }

        let value = producer().await?;
        let entry = Arc::new(CacheEntry::new(value.clone(), ttl));
        self.entries.write().insert(key, entry);
        Ok(value)
    }

    /// The value for `key` if it has not expired.
    pub fn get_live(&self, key: &K) -> Option<V> {
        let entry = self.entries.read().get(key).cloned()?;
        entry.is_live(Instant::now()).then(|| entry.value.clone())
    }

    /// The last stored value for `key`, regardless of age.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).map(|e| e.value.clone())
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    async fn counted(calls: &AtomicU32, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn producer_runs_once_within_ttl() {
        let cache = TtlCache::new();
        let calls = AtomicU32::new(0);

        let a = cache.get_or_compute("k", TTL, || counted(&calls, 1)).await;
        tokio::time::advance(Duration::from_secs(299)).await;
        let b = cache.get_or_compute("k", TTL, || counted(&calls, 2)).await;

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn producer_reruns_after_expiry() {
        let cache = TtlCache::new();
        let calls = AtomicU32::new(0);

        cache.get_or_compute("k", TTL, || counted(&calls, 1)).await.unwrap();
        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        let v = cache.get_or_compute("k", TTL, || counted(&calls, 2)).await;

        assert_eq!(v, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_live(&"k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_exactly_at_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new();
        cache.get_or_compute("k", TTL, || async { Ok::<_, ()>(1) }).await.unwrap();
        tokio::time::advance(TTL).await;
        assert_eq!(cache.get_live(&"k"), None);
        assert_eq!(cache.peek(&"k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_stale_value() {
        let cache = TtlCache::new();
        cache
            .get_or_compute("k", TTL, || async { Ok::<u32, String>(7) })
            .await
            .unwrap();

        tokio::time::advance(TTL * 2).await;
        let err = cache
            .get_or_compute("k", TTL, || async { Err::<u32, _>("upstream down".to_string()) })
            .await;

        assert_eq!(err, Err("upstream down".to_string()));
        assert_eq!(cache.peek(&"k"), Some(7));
        assert_eq!(cache.get_live(&"k"), None);
    }

    #[tokio::test]
    async fn failed_first_compute_stores_nothing() {
        let cache: TtlCache<&str, u32> = TtlCache::new();
        let res = cache.get_or_compute("k", TTL, || async { Err::<u32, _>("boom") }).await;
        assert_eq!(res, Err("boom"));
        assert_eq!(cache.peek(&"k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_have_independent_ttls() {
        let cache = TtlCache::new();
        cache
            .get_or_compute("depth", Duration::from_secs(60), || async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        cache.get_or_compute("candles", TTL, || async { Ok::<_, ()>(2) }).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get_live(&"depth"), None);
        assert_eq!(cache.get_live(&"candles"), Some(2));
    }
}
