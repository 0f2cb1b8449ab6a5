//! Disaster service library.
//!
//! Serves normalized hazard data aggregated from upstream feeds, with a
//! TTL-bounded cache between the providers and the HTTP API.
//!
//! # Architecture
//!
//! ```text
//!                 ensure_fresh()            snapshot()
//! HTTP request ----> RefreshCoordinator ----> HazardStore ----> QueryEngine
//!                        |  (stale?)
//!                        v
//!                  NwsFeed + UsgsFeed  (concurrent, empty on failure)
//! ```
//!
//! Refreshes are request-driven: the coordinator fetches both feeds only
//! when a query finds the snapshot older than the TTL, and replaces the
//! cache atomically so readers never observe a half-written state. A
//! single-flight lock collapses concurrent stale detectors into one refresh.
//!
//! # Example
//!
//! ```ignore
//! use disaster_service::{create_router, AppState, MemoryHazardStore, RefreshCoordinator};
//! use hazard_feeds::{NwsFeed, UsgsFeed};
//!
//! let coordinator = RefreshCoordinator::new(MemoryHazardStore::new(), NwsFeed::new(), UsgsFeed::new());
//! let router = create_router(AppState { coordinator });
//! ```

pub mod api;
pub mod error;
pub mod query;
pub mod refresh;
pub mod store;

pub use api::{create_router, ApiResponse, AppState};
pub use error::{Error, Result};
pub use query::{
    run_query, DisasterData, DisasterParams, HazardFilter, HazardItem, Location, SourceCounts,
    DEFAULT_LIMIT, MAX_LIMIT,
};
pub use refresh::{RefreshCoordinator, DEFAULT_CACHE_TTL};
pub use store::{HazardStore, MemoryHazardStore};
