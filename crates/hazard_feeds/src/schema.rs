//! Canonical hazard schema definitions.
//!
//! Every upstream feed is mapped into [`HazardRecord`]; downstream code
//! (cache, query engine, API) only ever sees this shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream provider a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardSource {
    /// National Weather Service active-alert feed.
    Nws,
    /// USGS earthquake feed.
    Usgs,
}

impl HazardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardSource::Nws => "nws",
            HazardSource::Usgs => "usgs",
        }
    }
}

impl fmt::Display for HazardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nws" => Ok(HazardSource::Nws),
            "usgs" => Ok(HazardSource::Usgs),
            other => Err(format!("unknown source '{}'", other)),
        }
    }
}

/// Normalized hazard category.
///
/// Always derived from the provider's event vocabulary via explicit mapping
/// tables in the adapters, never provider-native text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    Tornado,
    Hurricane,
    Flood,
    Wildfire,
    Earthquake,
    Other,
}

impl HazardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Tornado => "tornado",
            HazardType::Hurricane => "hurricane",
            HazardType::Flood => "flood",
            HazardType::Wildfire => "wildfire",
            HazardType::Earthquake => "earthquake",
            HazardType::Other => "other",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tornado" => Ok(HazardType::Tornado),
            "hurricane" => Ok(HazardType::Hurricane),
            "flood" => Ok(HazardType::Flood),
            "wildfire" => Ok(HazardType::Wildfire),
            "earthquake" => Ok(HazardType::Earthquake),
            "other" => Ok(HazardType::Other),
            other => Err(format!("unknown hazard type '{}'", other)),
        }
    }
}

/// Normalized severity, totally ordered: extreme > severe > moderate > minor.
///
/// Variant order matters: `derive(Ord)` relies on minor being declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            "extreme" => Ok(Severity::Extreme),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// One normalized hazard/alert/event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardRecord {
    /// Globally unique `{source}-{providerId}`, so providers reusing opaque
    /// IDs cannot collide.
    pub id: String,
    /// Which upstream feed produced this record.
    pub source: HazardSource,
    /// Normalized hazard category.
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    /// Human-readable headline.
    pub title: String,
    /// Longer description text.
    pub description: String,
    /// Protective-action text; NWS alerts only.
    pub instructions: Option<String>,
    /// Derived severity bucket.
    pub severity: Severity,
    /// When the hazard starts (or started).
    pub start_time: DateTime<Utc>,
    /// When the hazard ends (or was last updated, for seismic events).
    pub end_time: DateTime<Utc>,
    /// Best-effort 2-letter region code or truncated free text; may be
    /// "Unknown". Heuristic only, never load-bearing.
    pub state: String,
    /// Original free-text location, retained verbatim.
    pub area_desc: String,
    /// Representative latitude (point, or unweighted vertex mean of a polygon).
    pub lat: f64,
    /// Representative longitude.
    pub lng: f64,
    /// Link back to the authoritative provider page.
    pub url: String,
    /// Opaque provider-specific fields kept for audit; never filtered on.
    pub raw: serde_json::Value,
    /// When this record was written into the cache.
    pub fetched_at: DateTime<Utc>,
}
