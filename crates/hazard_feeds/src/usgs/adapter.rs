//! USGS feed implementation.

use chrono::{DateTime, TimeZone, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::schema::{HazardRecord, HazardSource, HazardType, Severity};
use crate::traits::FeedSource;
use crate::usgs::types::QuakeFeature;

/// Base URL for the USGS FDSN event API.
const USGS_API_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Default per-request timeout.
const DEFAULT_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// USGS earthquake feed: newest 50 events at magnitude 2.5 and above.
#[derive(Debug, Clone)]
pub struct UsgsFeed {
    http: reqwest::Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl Default for UsgsFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl UsgsFeed {
    /// Create a new feed against the production USGS API.
    pub fn new() -> Self {
        Self::with_base_url(USGS_API_BASE_URL)
    }

    /// Create a new feed with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn try_fetch(&self) -> Result<Vec<HazardRecord>> {
        let url = format!(
            "{}/fdsnws/event/1/query?format=geojson&limit=50&orderby=time&minmagnitude=2.5",
            self.base_url
        );
        debug!("Fetching USGS events from: {}", url);

        let response = self.http.get(&url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "USGS API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_events(&body, Utc::now())
    }
}

impl FeedSource for UsgsFeed {
    const NAME: &'static str = "usgs";

    fn source(&self) -> HazardSource {
        HazardSource::Usgs
    }

    async fn fetch(&self) -> Vec<HazardRecord> {
        match self.try_fetch().await {
            Ok(records) => {
                debug!("USGS returned {} events", records.len());
                records
            }
            Err(e) => {
                warn!("Failed to fetch USGS events: {:?}", e);
                counter!("hazard_feed_errors_total", "source" => Self::NAME).increment(1);
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// Magnitude to severity buckets. Boundaries are inclusive on the upper
/// bucket: 7.0 is extreme, 5.0 is severe, 3.0 is moderate.
pub fn magnitude_to_severity(mag: f64) -> Severity {
    if mag >= 7.0 {
        Severity::Extreme
    } else if mag >= 5.0 {
        Severity::Severe
    } else if mag >= 3.0 {
        Severity::Moderate
    } else {
        Severity::Minor
    }
}

/// Best-effort state from a place string like "10km SSE of Ridgecrest, CA".
///
/// Looks for a trailing two-capital-letter code after the last comma, then
/// falls back to a couple of named regions the feed reports without one.
pub fn state_from_place(place: &str) -> String {
    if let Some(comma_idx) = place.rfind(',') {
        let tail = place[comma_idx + 1..].trim();
        if tail.len() == 2 && tail.chars().all(|c| c.is_ascii_uppercase()) {
            return tail.to_string();
        }
    }
    let lower = place.to_lowercase();
    if lower.contains("alaska") {
        return "AK".to_string();
    }
    if lower.contains("hawaii") {
        return "HI".to_string();
    }
    "Unknown".to_string()
}

// ============================================================================
// Parsing & Transformation
// ============================================================================

/// Parse the raw feed body into normalized records, skipping malformed
/// features individually.
pub(crate) fn parse_events(body: &str, now: DateTime<Utc>) -> Result<Vec<HazardRecord>> {
    let collection: serde_json::Value = serde_json::from_str(body)?;
    let features = collection
        .get("features")
        .and_then(|f| f.as_array())
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::new();
    for feature in features {
        let feature: QuakeFeature = match serde_json::from_value(feature) {
            Ok(f) => f,
            Err(e) => {
                debug!("Skipping malformed USGS event: {}", e);
                continue;
            }
        };
        if let Some(record) = transform_event(feature, now) {
            records.push(record);
        }
    }
    Ok(records)
}

fn transform_event(feature: QuakeFeature, now: DateTime<Utc>) -> Option<HazardRecord> {
    let props = feature.properties?;
    let coordinates = feature.geometry.map(|g| g.coordinates).unwrap_or_default();

    let lng = coordinates.first().copied().unwrap_or(0.0);
    let lat = coordinates.get(1).copied().unwrap_or(0.0);
    let depth = coordinates.get(2).copied().unwrap_or(0.0);

    let mag = props.mag.unwrap_or(0.0);
    let place = props
        .place
        .clone()
        .unwrap_or_else(|| "Unknown location".to_string());
    let provider_id = feature.id.unwrap_or_default();

    let start_time = epoch_millis(props.time).unwrap_or(now);
    let end_time = epoch_millis(props.updated).unwrap_or(start_time);

    Some(HazardRecord {
        id: format!("usgs-{}", provider_id),
        source: HazardSource::Usgs,
        hazard_type: HazardType::Earthquake,
        title: format!("M{:.1} Earthquake — {}", mag, place),
        description: format!(
            "Magnitude {:.1} earthquake at depth {:.1} km. {}.",
            mag, depth, place
        ),
        instructions: None,
        severity: magnitude_to_severity(mag),
        start_time,
        end_time,
        state: state_from_place(&place),
        area_desc: place.clone(),
        lat,
        lng,
        url: props.url.clone().unwrap_or_else(|| {
            format!(
                "https://earthquake.usgs.gov/earthquakes/eventpage/{}",
                provider_id
            )
        }),
        raw: json!({
            "eventType": "Earthquake",
            "areaDesc": place,
            "magnitude": mag,
            "depth": depth,
            "status": props.status,
        }),
        fetched_at: now,
    })
}

fn epoch_millis(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_json(mag: f64, place: &str) -> serde_json::Value {
        json!({
            "id": "ci40462360",
            "properties": {
                "mag": mag,
                "place": place,
                "time": 1709294400000i64,
                "updated": 1709298000000i64,
                "status": "reviewed",
                "url": "https://earthquake.usgs.gov/earthquakes/eventpage/ci40462360"
            },
            "geometry": {
                "coordinates": [-117.67, 35.62, 8.3]
            }
        })
    }

    fn body_with(features: Vec<serde_json::Value>) -> String {
        json!({ "features": features }).to_string()
    }

    #[test]
    fn test_magnitude_buckets_are_boundary_exact() {
        assert_eq!(magnitude_to_severity(7.0), Severity::Extreme);
        assert_eq!(magnitude_to_severity(6.999), Severity::Severe);
        assert_eq!(magnitude_to_severity(5.0), Severity::Severe);
        assert_eq!(magnitude_to_severity(4.999), Severity::Moderate);
        assert_eq!(magnitude_to_severity(3.0), Severity::Moderate);
        assert_eq!(magnitude_to_severity(2.999), Severity::Minor);
    }

    #[test]
    fn test_state_from_trailing_code() {
        assert_eq!(state_from_place("10km SSE of Ridgecrest, CA"), "CA");
        assert_eq!(state_from_place("3km NW of Houston, TX"), "TX");
    }

    #[test]
    fn test_state_named_region_fallbacks() {
        assert_eq!(state_from_place("central Alaska"), "AK");
        assert_eq!(state_from_place("5 km S of Volcano, Hawaii"), "HI");
    }

    #[test]
    fn test_state_unknown_for_foreign_places() {
        assert_eq!(state_from_place("south of the Fiji Islands"), "Unknown");
        assert_eq!(state_from_place("near the coast of Honshu, Japan"), "Unknown");
    }

    #[test]
    fn test_transform_full_record() {
        let now = Utc::now();
        let body = body_with(vec![feature_json(4.5, "10km SSE of Ridgecrest, CA")]);
        let records = parse_events(&body, now).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "usgs-ci40462360");
        assert_eq!(record.source, HazardSource::Usgs);
        assert_eq!(record.hazard_type, HazardType::Earthquake);
        assert_eq!(record.title, "M4.5 Earthquake — 10km SSE of Ridgecrest, CA");
        assert_eq!(record.severity, Severity::Moderate);
        assert_eq!(record.state, "CA");
        assert_eq!(record.lat, 35.62);
        assert_eq!(record.lng, -117.67);
        assert!(record.description.contains("depth 8.3 km"));
        assert_eq!(record.instructions, None);
        assert_eq!(record.start_time.timestamp_millis(), 1709294400000);
        assert_eq!(record.end_time.timestamp_millis(), 1709298000000);
        assert_eq!(record.raw["magnitude"], 4.5);
        assert_eq!(record.raw["status"], "reviewed");
    }

    #[test]
    fn test_missing_updated_falls_back_to_event_time() {
        let mut feature = feature_json(3.2, "central Alaska");
        feature["properties"].as_object_mut().unwrap().remove("updated");
        let body = body_with(vec![feature]);
        let records = parse_events(&body, Utc::now()).unwrap();
        assert_eq!(records[0].end_time, records[0].start_time);
    }

    #[test]
    fn test_missing_magnitude_defaults_to_minor() {
        let mut feature = feature_json(0.0, "somewhere");
        feature["properties"].as_object_mut().unwrap().remove("mag");
        let body = body_with(vec![feature]);
        let records = parse_events(&body, Utc::now()).unwrap();
        assert_eq!(records[0].severity, Severity::Minor);
        assert_eq!(records[0].title, "M0.0 Earthquake — somewhere");
    }

    #[test]
    fn test_malformed_feature_skipped() {
        let body = body_with(vec![
            json!({ "properties": 42 }),
            feature_json(5.1, "10km SSE of Ridgecrest, CA"),
        ]);
        let records = parse_events(&body, Utc::now()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Severe);
    }
}
