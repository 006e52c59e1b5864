//! Time-windowed cache in front of the aggregator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use cnrates_common::{constants, is_within, now, CombinedRates, Timestamp};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::aggregator::CombinedRatesSource;

/// Cached snapshot entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: CombinedRates,
    fetched_at: Timestamp,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        is_within(self.fetched_at, ttl)
    }
}

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a snapshot is served before refetching.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::cache_window(),
        }
    }
}

/// Serves one combined snapshot, refetching it once it is older than the TTL.
///
/// Reads of a fresh entry only take a short read lock. Refreshes are
/// serialized, so concurrent misses produce a single upstream fetch.
pub struct RateCache {
    source: Arc<dyn CombinedRatesSource>,
    entry: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
    config: RateCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new(source: Arc<dyn CombinedRatesSource>) -> Self {
        Self::with_config(source, RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(source: Arc<dyn CombinedRatesSource>, config: RateCacheConfig) -> Self {
        Self {
            source,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Get the current snapshot, fetching a new one if the cached one is stale.
    #[instrument(skip(self))]
    pub async fn get_rates(&self) -> CombinedRates {
        if let Some(value) = self.fresh_value() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit");
            return value;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss");

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(value) = self.fresh_value() {
            debug!("Cache refreshed by concurrent request");
            return value;
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);

        let fetched_at = now();
        let value = self.source.fetch_combined().await;

        *self.entry.write() = Some(CacheEntry {
            value: value.clone(),
            fetched_at,
        });

        info!(fetched_at = %fetched_at, success = value.success, "Cached new rate snapshot");
        value
    }

    /// When the current entry was fetched, if there is one.
    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.entry.read().as_ref().map(|entry| entry.fetched_at)
    }

    /// Drop the cached snapshot so the next call refetches.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fresh: self.fresh_value().is_some(),
        }
    }

    fn fresh_value(&self) -> Option<CombinedRates> {
        self.entry
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(self.config.ttl))
            .map(|entry| entry.value.clone())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls served from a fresh entry.
    pub hits: u64,
    /// Calls that found no fresh entry on arrival.
    pub misses: u64,
    /// Upstream aggregations actually run.
    pub fetches: u64,
    /// Whether a fresh snapshot is held right now.
    pub fresh: bool,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
