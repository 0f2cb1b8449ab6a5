//! Hazard feed clients for transforming upstream alert data to a unified schema.
//!
//! This crate provides a plugin-based architecture for pulling hazard data
//! from upstream providers and normalizing it. To add support for a new
//! provider, implement the `FeedSource` trait.
//!
//! # Architecture
//!
//! ```text
//! Upstream feed (HTTP) --> FeedSource --> Vec<HazardRecord>
//!                          (fetch & normalize)
//! ```
//!
//! Each adapter embeds its mapping tables (event type, severity vocabulary,
//! magnitude buckets) and exposes them as pure functions; no inference
//! happens beyond those tables. A failing feed logs and returns an empty
//! list, so one provider outage never blocks the other feed.
//!
//! # Usage
//!
//! ```ignore
//! use hazard_feeds::{FeedSource, NwsFeed, UsgsFeed};
//!
//! let weather = NwsFeed::new();
//! let seismic = UsgsFeed::new();
//! let (alerts, quakes) = tokio::join!(weather.fetch(), seismic.fetch());
//! ```

pub mod error;
pub mod nws;
pub mod schema;
pub mod traits;
pub mod usgs;

// Re-export core types
pub use error::{Error, Result};
pub use schema::{HazardRecord, HazardSource, HazardType, Severity};
pub use traits::FeedSource;

// Re-export feed adapters
pub use nws::NwsFeed;
pub use usgs::UsgsFeed;
