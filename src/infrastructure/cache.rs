//! In-memory TTL cache for market data

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Time source, injectable so tests can drive expiry deterministically
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
    ttl_secs: i64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.fetched_at).num_seconds() > self.ttl_secs
    }
}

/// Cache counters, for the status surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
}

struct CacheInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    expirations: u64,
}

/// Keyed TTL cache, safe for concurrent use. Expiry is lazy (checked on
/// read, never swept): key cardinality is bounded by the watched symbols
/// plus one sentiment key, and cycles are minutes apart. The single lock is
/// only ever held for map operations, never across a network call.
pub struct DataCache<K, V> {
    inner: Mutex<CacheInner<K, V>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> DataCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                expirations: 0,
            }),
            clock,
        }
    }

    /// Fresh read. An entry past its TTL is evicted and counts as a miss.
    pub async fn get(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        let now = self.clock.now();
        let mut guard = self.inner.lock().await;
        let cached = guard
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.fetched_at, entry.is_expired(now)));
        match cached {
            Some((value, fetched_at, false)) => {
                guard.hits += 1;
                let age = (now - fetched_at).num_seconds();
                debug!("Cache HIT: key={} age={}s", key, age);
                Some((value, fetched_at))
            }
            Some((_, _, true)) => {
                guard.entries.remove(key);
                guard.expirations += 1;
                guard.misses += 1;
                debug!("Cache EXPIRED: key={}", key);
                None
            }
            None => {
                guard.misses += 1;
                debug!("Cache MISS: key={}", key);
                None
            }
        }
    }

    /// Degraded-mode read: returns the entry regardless of expiry and never
    /// evicts. Callers decide whether serving it is acceptable.
    pub async fn get_stale(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        let now = self.clock.now();
        let guard = self.inner.lock().await;
        guard.entries.get(key).map(|entry| {
            let age = (now - entry.fetched_at).num_seconds();
            debug!(
                "Stale cache read: key={} age={}s (ttl={}s)",
                key, age, entry.ttl_secs
            );
            (entry.value.clone(), entry.fetched_at)
        })
    }

    /// Insert or overwrite, recording fetch time as now
    pub async fn set(&self, key: K, value: V, ttl_secs: u64) {
        let now = self.clock.now();
        let mut guard = self.inner.lock().await;
        debug!("Cache SET: key={} ttl={}s", key, ttl_secs);
        guard.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                ttl_secs: ttl_secs as i64,
            },
        );
    }

    pub async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        let count = guard.entries.len();
        guard.entries.clear();
        guard.hits = 0;
        guard.misses = 0;
        guard.expirations = 0;
        info!("Cache cleared: removed {} entries", count);
    }

    pub async fn keys(&self) -> Vec<K> {
        self.inner.lock().await.entries.keys().cloned().collect()
    }

    pub async fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().await;
        CacheStats {
            entries: guard.entries.len(),
            hits: guard.hits,
            misses: guard.misses,
            expirations: guard.expirations,
        }
    }
}

impl<K, V> Default for DataCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: StdMutex::new(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            }
        }

        fn advance_secs(&self, secs: i64) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn test_get_within_ttl_returns_original_fetch_time() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<String, u32> = DataCache::with_clock(clock.clone());
        let key = "^GSPC".to_string();

        cache.set(key.clone(), 7, 60).await;
        let fetched_at = clock.now();
        clock.advance_secs(30);

        let (value, at) = cache.get(&key).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(at, fetched_at);
    }

    #[tokio::test]
    async fn test_expired_entry_serves_stale_until_evicting_get() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<String, u32> = DataCache::with_clock(clock.clone());
        let key = "^GSPC".to_string();

        cache.set(key.clone(), 7, 60).await;
        clock.advance_secs(61);

        // Stale read ignores expiry and does not evict.
        assert!(cache.get_stale(&key).await.is_some());
        assert!(cache.get_stale(&key).await.is_some());

        // Fresh read misses and evicts; the entry is gone afterwards.
        assert!(cache.get(&key).await.is_none());
        assert!(cache.keys().await.is_empty());
        assert!(cache.get_stale(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_exact_ttl_age_is_not_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<String, u32> = DataCache::with_clock(clock.clone());
        let key = "k".to_string();

        cache.set(key.clone(), 1, 60).await;
        clock.advance_secs(60);
        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<String, u32> = DataCache::with_clock(clock.clone());
        let key = "k".to_string();

        cache.set(key.clone(), 1, 60).await;
        clock.advance_secs(59);
        cache.set(key.clone(), 2, 60).await;
        clock.advance_secs(59);

        let (value, _) = cache.get(&key).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_stats_count_hits_misses_expirations() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<String, u32> = DataCache::with_clock(clock.clone());
        let key = "k".to_string();

        assert!(cache.get(&key).await.is_none());
        cache.set(key.clone(), 1, 60).await;
        assert!(cache.get(&key).await.is_some());
        clock.advance_secs(61);
        assert!(cache.get(&key).await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let cache: DataCache<String, u32> = DataCache::new();
        cache.set("a".to_string(), 1, 60).await;
        cache.set("b".to_string(), 2, 60).await;
        assert_eq!(cache.keys().await.len(), 2);

        cache.clear().await;
        assert!(cache.keys().await.is_empty());
        assert_eq!(cache.stats().await, CacheStats::default());
    }
}
