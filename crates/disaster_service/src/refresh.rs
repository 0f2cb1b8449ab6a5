//! Refresh coordination for the hazard cache.
//!
//! Refreshes are request-driven: there is no background scheduler, a query
//! triggers a refresh only when the cached snapshot is older than the TTL.
//! Both feeds are fetched concurrently, so latency is bounded by the slower
//! feed rather than their sum.

use std::time::Duration;

use chrono::Utc;
use hazard_feeds::{FeedSource, HazardRecord};
use metrics::counter;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::store::HazardStore;

/// Maximum snapshot age before a query triggers a refresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Coordinates cache staleness checks and atomic snapshot replacement.
///
/// The coordinator is the sole writer of the store. It is generic over the
/// store and both feeds so tests can inject stubs.
pub struct RefreshCoordinator<S, W, Q> {
    store: S,
    weather: W,
    seismic: Q,
    ttl: Duration,
    /// Single-flight guard: concurrent stale detectors queue here and
    /// re-check staleness, so one refresh serves all of them instead of
    /// each issuing its own round of upstream fetches.
    refresh_lock: Mutex<()>,
}

impl<S, W, Q> RefreshCoordinator<S, W, Q>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    /// Create a coordinator with the default TTL.
    pub fn new(store: S, weather: W, seismic: Q) -> Self {
        Self {
            store,
            weather,
            seismic,
            ttl: DEFAULT_CACHE_TTL,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Override the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read access to the underlying store for the query path.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the snapshot is missing or older than the TTL.
    async fn is_stale(&self) -> Result<bool> {
        match self.store.last_fetch().await? {
            None => Ok(true),
            Some(last) => {
                let age = Utc::now().signed_duration_since(last);
                Ok(age.num_milliseconds() > self.ttl.as_millis() as i64)
            }
        }
    }

    /// Refresh the cache if it is stale, otherwise do nothing.
    ///
    /// Store failures propagate; upstream failures never do (the feeds
    /// absorb them into empty lists).
    pub async fn ensure_fresh(&self) -> Result<()> {
        if !self.is_stale().await? {
            return Ok(());
        }
        let _guard = self.refresh_lock.lock().await;
        // Another request may have refreshed while this one waited.
        if !self.is_stale().await? {
            return Ok(());
        }
        self.refresh().await
    }

    /// Fetch both feeds and replace the snapshot.
    ///
    /// An all-empty fetch keeps the previous snapshot and only bumps the
    /// timestamp, so a provider outage neither discards good data nor turns
    /// into a refresh storm.
    pub async fn refresh(&self) -> Result<()> {
        info!("Refreshing hazard cache from {} + {}", W::NAME, Q::NAME);
        counter!("hazard_cache_refresh_total").increment(1);

        let (weather, seismic) = tokio::join!(self.weather.fetch(), self.seismic.fetch());
        info!(
            "Fetched {} {} alerts + {} {} events",
            weather.len(),
            W::NAME,
            seismic.len(),
            Q::NAME
        );

        let now = Utc::now();
        let mut records: Vec<HazardRecord> = weather;
        records.extend(seismic);

        if records.is_empty() {
            counter!("hazard_cache_refresh_empty_total").increment(1);
            self.store.touch_last_fetch(now).await?;
            return Ok(());
        }

        for record in &mut records {
            record.fetched_at = now;
        }
        let count = records.len();
        self.store.replace_all(records, now).await?;
        info!("Cached {} hazards", count);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
