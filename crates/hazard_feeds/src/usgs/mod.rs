//! USGS earthquake feed adapter.
//!
//! Fetches recent events at magnitude 2.5 and above and normalizes them into
//! `HazardRecord`s; severity comes from magnitude buckets.

mod adapter;
mod types;

pub use adapter::UsgsFeed;
pub use types::{QuakeFeature, QuakeGeometry, QuakeProperties};
