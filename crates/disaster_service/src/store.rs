//! Cache storage for hazard records.
//!
//! The store is an injectable interface rather than a process-wide singleton:
//! the refresh coordinator is its only writer, everything else reads. The
//! snapshot is replaced wholesale, never patched, so a reader always sees
//! either the complete previous snapshot or the complete new one.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hazard_feeds::HazardRecord;
use tokio::sync::RwLock;

use crate::error::Result;

/// Storage interface for the hazard cache.
///
/// `replace_all` must be atomic with respect to `snapshot`: no reader may
/// observe a half-replaced set. Implementations report failures through
/// `Error::Store`, which callers surface as server errors rather than
/// swallowing (a refresh must never leave the store partially deleted).
pub trait HazardStore: Send + Sync + 'static {
    /// Full current snapshot of cached records.
    fn snapshot(&self) -> impl Future<Output = Result<Vec<HazardRecord>>> + Send;

    /// When the last refresh attempt ran, if any.
    fn last_fetch(&self) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send;

    /// Record a refresh attempt without touching the cached records.
    fn touch_last_fetch(&self, at: DateTime<Utc>) -> impl Future<Output = Result<()>> + Send;

    /// Atomically delete every existing record, insert the new set, and
    /// update the refresh timestamp.
    fn replace_all(
        &self,
        records: Vec<HazardRecord>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory store backed by a read-write lock.
///
/// Starts empty; the first `ensure_fresh` populates it. The write lock makes
/// the delete-and-insert replace a single atomic step for readers.
#[derive(Debug, Clone, Default)]
pub struct MemoryHazardStore {
    inner: Arc<RwLock<CacheState>>,
}

#[derive(Debug, Default)]
struct CacheState {
    records: Vec<HazardRecord>,
    last_fetch: Option<DateTime<Utc>>,
}

impl MemoryHazardStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HazardStore for MemoryHazardStore {
    async fn snapshot(&self) -> Result<Vec<HazardRecord>> {
        Ok(self.inner.read().await.records.clone())
    }

    async fn last_fetch(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.read().await.last_fetch)
    }

    async fn touch_last_fetch(&self, at: DateTime<Utc>) -> Result<()> {
        self.inner.write().await.last_fetch = Some(at);
        Ok(())
    }

    async fn replace_all(&self, records: Vec<HazardRecord>, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.inner.write().await;
        state.records = records;
        state.last_fetch = Some(at);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
