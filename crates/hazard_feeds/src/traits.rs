//! Core trait for hazard feeds (plugin interface).
//!
//! To add a new upstream provider, implement the `FeedSource` trait.
//! The refresh coordinator in the service crate is generic over it.

use std::future::Future;

use crate::schema::{HazardRecord, HazardSource};

/// A single upstream hazard feed.
///
/// `fetch` must never fail: any network, HTTP-status, or decode problem is
/// logged and yields an empty list, so one provider outage never blocks the
/// other feed. Parsing is kept in separate pure functions per adapter so it
/// stays unit-testable without a network.
pub trait FeedSource: Send + Sync {
    /// Provider name used in logs and metrics labels.
    const NAME: &'static str;

    /// Which canonical source this feed produces records for.
    fn source(&self) -> HazardSource;

    /// Fetch and normalize the current feed contents.
    ///
    /// Returns an empty vector on any upstream failure.
    fn fetch(&self) -> impl Future<Output = Vec<HazardRecord>> + Send;
}
