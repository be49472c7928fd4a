//! Drawdown monitoring: tick orchestration and the periodic loop

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::domain::alert::{AlertKey, AlertState};
use crate::domain::drawdown::{count_days_at_or_below, metrics_from_series, DrawdownMetrics};
use crate::infrastructure::cache::{CacheStats, DataCache};
use crate::infrastructure::market::{PriceSource, SentimentSource};
use crate::infrastructure::persistence::AlertStateStore;
use crate::shared::errors::MetricsError;
use crate::shared::types::{AlertEvent, PriceSeries, SentimentReading, WatchConfig};

const SENTIMENT_CACHE_KEY: &str = "fear_greed";

/// Operational counters, reset only on restart
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub ticks_completed: u64,
    pub alerts_fired: u64,
    pub symbols_skipped: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

/// Outcome of one evaluation cycle. `armed` is the state snapshot the caller
/// persists - requested every tick, even with zero events, since recoveries
/// alone change the state.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub events: Vec<AlertEvent>,
    pub armed: HashSet<AlertKey>,
}

/// Composes the cache, the upstream sources, the alert state and the store
/// for one watch list. Built once at startup and shared by reference: the
/// periodic loop and interactive queries operate on the same instance.
pub struct DrawdownMonitor {
    config: WatchConfig,
    price_source: Arc<dyn PriceSource>,
    sentiment_source: Arc<dyn SentimentSource>,
    store: Arc<dyn AlertStateStore>,
    history_cache: DataCache<String, PriceSeries>,
    sentiment_cache: DataCache<String, SentimentReading>,
    state: RwLock<AlertState>,
    stats: RwLock<MonitorStats>,
}

impl DrawdownMonitor {
    pub fn new(
        config: WatchConfig,
        price_source: Arc<dyn PriceSource>,
        sentiment_source: Arc<dyn SentimentSource>,
        store: Arc<dyn AlertStateStore>,
    ) -> Self {
        Self {
            config,
            price_source,
            sentiment_source,
            store,
            history_cache: DataCache::new(),
            sentiment_cache: DataCache::new(),
            state: RwLock::new(AlertState::new()),
            stats: RwLock::new(MonitorStats::default()),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Rehydrate the armed set from storage. A load failure starts from an
    /// empty state; worst case is one redundant alert after a restart.
    pub async fn hydrate_state(&self) {
        match self.store.load().await {
            Ok(keys) => {
                if !keys.is_empty() {
                    info!("Loaded {} armed alert state(s)", keys.len());
                }
                self.state.write().await.hydrate(keys);
            }
            Err(e) => warn!("Failed to load alert state, starting disarmed: {}", e),
        }
    }

    /// Cache-first price history. A fresh fetch failure falls back to a
    /// stale entry when one exists; the bool flags that degraded path.
    pub async fn get_series(&self, symbol: &str) -> Option<(PriceSeries, bool)> {
        let key = symbol.to_string();
        // Snapshot any existing entry before the fresh read: `get` evicts an
        // expired entry, and the fallback below still needs it if the fetch
        // fails.
        let stale_backup = self.history_cache.get_stale(&key).await;
        if let Some((series, _)) = self.history_cache.get(&key).await {
            return Some((series, false));
        }

        let end = Utc::now();
        let start = end - ChronoDuration::days(i64::from(self.config.history_years) * 365);
        match self.price_source.fetch_history(symbol, start, end).await {
            Ok(closes) if closes.len() >= 2 => {
                let series = PriceSeries::new(symbol, closes, Utc::now());
                self.history_cache
                    .set(key, series.clone(), self.config.cache_ttl_secs)
                    .await;
                return Some((series, false));
            }
            Ok(closes) => warn!("History for {} too short: {} close(s)", symbol, closes.len()),
            Err(e) => warn!("History fetch for {} failed: {}", symbol, e),
        }
        stale_backup.map(|(series, fetched_at)| {
            warn!("Serving stale history for {} fetched at {}", symbol, fetched_at);
            (series, true)
        })
    }

    /// Current drawdown metrics for one symbol. `Ok(None)` means market data
    /// is unavailable this cycle.
    pub async fn get_metrics(
        &self,
        symbol: &str,
    ) -> Result<Option<(DrawdownMetrics, DateTime<Utc>)>, MetricsError> {
        let Some((series, _degraded)) = self.get_series(symbol).await else {
            return Ok(None);
        };
        let metrics = metrics_from_series(&series)?;
        Ok(Some((metrics, series.fetched_at)))
    }

    /// Sentiment gauge, cached under its own key with the same fallback
    /// behavior as price history.
    pub async fn get_sentiment(&self) -> Option<(SentimentReading, DateTime<Utc>)> {
        let key = SENTIMENT_CACHE_KEY.to_string();
        let stale_backup = self.sentiment_cache.get_stale(&key).await;
        if let Some(hit) = self.sentiment_cache.get(&key).await {
            return Some(hit);
        }

        match self.sentiment_source.fetch_sentiment().await {
            Ok(reading) => {
                let now = Utc::now();
                self.sentiment_cache
                    .set(key, reading.clone(), self.config.cache_ttl_secs)
                    .await;
                Some((reading, now))
            }
            Err(e) => {
                warn!("Sentiment fetch failed: {}", e);
                stale_backup.map(|hit| {
                    warn!("Serving stale sentiment reading");
                    hit
                })
            }
        }
    }

    /// One evaluation cycle over every configured symbol. Per-symbol
    /// failures are isolated; a failing symbol is skipped for this cycle
    /// only. All fetching happens before any lock is taken.
    pub async fn run_tick(&self) -> TickReport {
        let fetches = self
            .config
            .indices
            .iter()
            .map(|index| async move { (index, self.get_series(&index.symbol).await) });
        let fetched = join_all(fetches).await;

        let mut events = Vec::new();
        let mut skipped = 0u64;

        for (index, maybe_series) in fetched {
            let Some((series, degraded)) = maybe_series else {
                debug!("No data for {} this cycle, skipping", index.symbol);
                skipped += 1;
                continue;
            };
            if degraded {
                warn!("Evaluating {} on stale data", index.symbol);
            }

            let metrics = match metrics_from_series(&series) {
                Ok(metrics) => metrics,
                Err(e) => {
                    error!("Metrics for {} failed: {}", index.symbol, e);
                    skipped += 1;
                    continue;
                }
            };

            let fired = {
                let mut state = self.state.write().await;
                state.evaluate_cycle(
                    &index.symbol,
                    metrics.current_drawdown_pct,
                    &self.config.thresholds_pct,
                )
            };

            let total_days = series.closes.len();
            for threshold_pct in fired {
                let day_count = count_days_at_or_below(&series.closes, -(f64::from(threshold_pct)));
                info!(
                    "🚨 Drawdown alert: {} at {:.2}% crossed -{}% ({} of {} historical days)",
                    index.display_name,
                    metrics.current_drawdown_pct,
                    threshold_pct,
                    day_count,
                    total_days
                );
                events.push(AlertEvent {
                    symbol: index.symbol.clone(),
                    display_name: index.display_name.clone(),
                    threshold_pct,
                    drawdown_pct: metrics.current_drawdown_pct,
                    day_count,
                    total_days,
                });
            }
        }

        let armed = self.state.read().await.snapshot();

        {
            let mut stats = self.stats.write().await;
            stats.ticks_completed += 1;
            stats.alerts_fired += events.len() as u64;
            stats.symbols_skipped += skipped;
            stats.last_tick = Some(Utc::now());
        }

        TickReport { events, armed }
    }

    /// Persist a tick's state snapshot. Failures are logged, never fatal:
    /// alert delivery must not block on storage.
    pub async fn persist_state(&self, armed: &HashSet<AlertKey>) {
        if let Err(e) = self.store.save(armed).await {
            warn!("Failed to save alert state: {}", e);
        }
    }

    /// Resident mode: evaluate on a fixed interval until shutdown
    pub async fn run_monitoring_loop(&self) {
        info!(
            "Starting drawdown monitoring: {} indices, thresholds {:?}, every {}s",
            self.config.indices.len(),
            self.config.thresholds_pct,
            self.config.check_interval_secs
        );
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            self.config.check_interval_secs,
        ));
        loop {
            interval.tick().await;
            let report = self.run_tick().await;
            if report.events.is_empty() {
                info!("No alerts this cycle");
            }
            self.persist_state(&report.armed).await;
        }
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    pub async fn armed_alerts(&self) -> HashSet<AlertKey> {
        self.state.read().await.snapshot()
    }

    pub async fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (
            self.history_cache.stats().await,
            self.sentiment_cache.stats().await,
        )
    }

    /// Drop all cached entries (admin surface)
    pub async fn clear_caches(&self) {
        self.history_cache.clear().await;
        self.sentiment_cache.clear().await;
    }
}
