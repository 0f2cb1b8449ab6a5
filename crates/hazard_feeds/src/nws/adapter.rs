//! NWS feed implementation.
//!
//! Handles fetching the active-alerts endpoint and normalizing alerts to the
//! canonical hazard schema via explicit mapping tables.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::nws::types::{AlertFeature, Geometry};
use crate::schema::{HazardRecord, HazardSource, HazardType, Severity};
use crate::traits::FeedSource;

/// Base URL for the NWS API.
const NWS_API_BASE_URL: &str = "https://api.weather.gov";

/// NWS requires an identifying User-Agent on every request.
const NWS_USER_AGENT: &str = "(hazardwatch disaster service, ops@hazardwatch.io)";

/// Default per-request timeout.
const DEFAULT_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Hard cap on retained alerts per fetch.
pub const MAX_ALERTS: usize = 100;

/// National Weather Service active-alert feed.
#[derive(Debug, Clone)]
pub struct NwsFeed {
    http: reqwest::Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl Default for NwsFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl NwsFeed {
    /// Create a new feed against the production NWS API.
    pub fn new() -> Self {
        Self::with_base_url(NWS_API_BASE_URL)
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
            "{}/alerts/active?status=actual&message_type=alert",
            self.base_url
        );
        debug!("Fetching NWS alerts from: {}", url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, NWS_USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "NWS API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_alerts(&body, Utc::now())
    }
}

impl FeedSource for NwsFeed {
    const NAME: &'static str = "nws";

    fn source(&self) -> HazardSource {
        HazardSource::Nws
    }

    async fn fetch(&self) -> Vec<HazardRecord> {
        match self.try_fetch().await {
            Ok(records) => {
                debug!("NWS returned {} relevant alerts", records.len());
                records
            }
            Err(e) => {
                warn!("Failed to fetch NWS alerts: {:?}", e);
                counter!("hazard_feed_errors_total", "source" => Self::NAME).increment(1);
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Mapping Tables
// ============================================================================

/// Event-type allow-list: alerts whose event is not listed here are dropped.
pub fn hazard_type_for_event(event: &str) -> Option<HazardType> {
    match event {
        "Tornado Warning"
        | "Tornado Watch"
        | "Tornado Emergency"
        | "Severe Thunderstorm Warning"
        | "Severe Thunderstorm Watch" => Some(HazardType::Tornado),
        "Hurricane Warning"
        | "Hurricane Watch"
        | "Hurricane Local Statement"
        | "Tropical Storm Warning"
        | "Tropical Storm Watch" => Some(HazardType::Hurricane),
        "Flash Flood Warning"
        | "Flash Flood Watch"
        | "Flood Warning"
        | "Flood Watch"
        | "Flood Advisory"
        | "Coastal Flood Warning"
        | "Coastal Flood Watch"
        | "Coastal Flood Advisory"
        | "River Flood Warning"
        | "River Flood Watch" => Some(HazardType::Flood),
        "Red Flag Warning" | "Fire Weather Watch" | "Fire Warning" => Some(HazardType::Wildfire),
        "Earthquake Warning" | "Tsunami Warning" | "Tsunami Watch" | "Tsunami Advisory" => {
            Some(HazardType::Earthquake)
        }
        _ => None,
    }
}

/// Provider severity vocabulary. Anything outside it (including "Unknown")
/// maps to minor.
pub fn severity_from_vocab(value: &str) -> Severity {
    match value {
        "Extreme" => Severity::Extreme,
        "Severe" => Severity::Severe,
        "Moderate" => Severity::Moderate,
        "Minor" => Severity::Minor,
        _ => Severity::Minor,
    }
}

/// Best-effort state extraction from an area description.
///
/// Takes the first semicolon-delimited segment; if the text after its last
/// comma is exactly two characters that is the state code, otherwise the
/// first 30 characters of the segment are used as-is.
pub fn extract_state(area_desc: &str) -> String {
    if area_desc.is_empty() {
        return "Unknown".to_string();
    }
    let first_area = area_desc.split(';').next().unwrap_or("").trim();
    if let Some(comma_idx) = first_area.rfind(',') {
        let code = first_area[comma_idx + 1..].trim();
        if code.chars().count() == 2 {
            return code.to_string();
        }
    }
    first_area.chars().take(30).collect()
}

// ============================================================================
// Parsing & Transformation
// ============================================================================

/// Parse the raw feed body into normalized records.
///
/// Features are deserialized one at a time so a single malformed alert is
/// skipped instead of failing the whole fetch. At most [`MAX_ALERTS`]
/// retained alerts are returned.
pub(crate) fn parse_alerts(body: &str, now: DateTime<Utc>) -> Result<Vec<HazardRecord>> {
    let collection: serde_json::Value = serde_json::from_str(body)?;
    let features = collection
        .get("features")
        .and_then(|f| f.as_array())
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::new();
    for feature in features {
        let feature: AlertFeature = match serde_json::from_value(feature) {
            Ok(f) => f,
            Err(e) => {
                debug!("Skipping malformed NWS alert: {}", e);
                continue;
            }
        };
        if let Some(record) = transform_alert(feature, now) {
            records.push(record);
            if records.len() == MAX_ALERTS {
                break;
            }
        }
    }
    Ok(records)
}

/// Normalize a single alert, or `None` if its event type is not in the
/// allow-list.
fn transform_alert(feature: AlertFeature, now: DateTime<Utc>) -> Option<HazardRecord> {
    let props = feature.properties?;
    let event = props.event.clone().unwrap_or_default();
    let hazard_type = hazard_type_for_event(&event)?;

    let severity = severity_from_vocab(props.severity.as_deref().unwrap_or(""));
    let area_desc = props.area_desc.clone().unwrap_or_default();
    let state = extract_state(&area_desc);
    let (lat, lng) = feature
        .geometry
        .as_ref()
        .and_then(Geometry::centroid)
        .unwrap_or((0.0, 0.0));

    let provider_id = props.id.clone().or(feature.id).unwrap_or_default();
    let start_time = props.onset.or(props.sent).or(props.effective).unwrap_or(now);
    let end_time = props
        .expires
        .or(props.ends)
        .unwrap_or(now + Duration::hours(24));
    let description = props
        .description
        .clone()
        .or(props.headline.clone())
        .unwrap_or_else(|| event.clone());

    Some(HazardRecord {
        id: format!("nws-{}", provider_id),
        source: HazardSource::Nws,
        hazard_type,
        title: format!("{} — {}", event, state),
        description,
        instructions: props.instruction.clone(),
        severity,
        start_time,
        end_time,
        state,
        area_desc: area_desc.clone(),
        lat,
        lng,
        url: format!("https://alerts.weather.gov/search?id={}", provider_id),
        raw: json!({
            "eventType": event,
            "areaDesc": area_desc,
            "severity": props.severity,
            "certainty": props.certainty,
            "urgency": props.urgency,
        }),
        fetched_at: now,
    })
}

// ============================================================================
// Tests
// ============================================================================
