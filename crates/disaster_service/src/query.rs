//! Filter parsing and query evaluation over the cached snapshot.
//!
//! Raw query parameters arrive as loose strings ([`DisasterParams`]) and are
//! validated into a typed [`HazardFilter`] before anything touches the
//! snapshot; unknown enum values, unparseable dates, and out-of-range months
//! are rejected up front instead of silently matching nothing.

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hazard_feeds::{HazardRecord, HazardSource, HazardType, Severity};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Returned items per query unless the caller asks for fewer.
pub const DEFAULT_LIMIT: usize = 100;

/// Hard ceiling on returned items, whatever the caller asks for.
pub const MAX_LIMIT: usize = 200;

// ============================================================================
// Filter Types
// ============================================================================

/// Raw query parameters as they arrive on the wire. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisasterParams {
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub hazard_type: Option<String>,
    pub state: Option<String>,
    pub severity: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub limit: Option<usize>,
}

/// Validated filters, composed conjunctively. Also serves as the `filters`
/// echo in the response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<HazardSource>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub hazard_type: Option<Vec<HazardType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Vec<Severity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub limit: usize,
}

impl HazardFilter {
    /// Validate raw parameters into typed filters.
    pub fn from_params(params: DisasterParams) -> Result<Self> {
        let source = parse_list::<HazardSource>(params.source.as_deref(), "source")?;
        let hazard_type = parse_list::<HazardType>(params.hazard_type.as_deref(), "type")?;
        let state = parse_list::<String>(params.state.as_deref(), "state")?;
        let severity = parse_list::<Severity>(params.severity.as_deref(), "severity")?;

        let start_date = parse_instant(params.start_date.as_deref(), "startDate")?;
        let end_date = parse_instant(params.end_date.as_deref(), "endDate")?;
        let start_time = parse_instant(params.start_time.as_deref(), "startTime")?;
        let end_time = parse_instant(params.end_time.as_deref(), "endTime")?;

        if let Some(month) = params.month {
            if !(1..=12).contains(&month) {
                return Err(Error::InvalidFilter(format!(
                    "month must be between 1 and 12, got {}",
                    month
                )));
            }
        }
        if let Some(year) = params.year {
            if NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
                return Err(Error::InvalidFilter(format!("year {} is out of range", year)));
            }
        }

        let limit = params
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Ok(Self {
            source,
            hazard_type,
            state,
            severity,
            start_date,
            end_date,
            start_time,
            end_time,
            month: params.month,
            year: params.year,
            limit,
        })
    }

    /// Effective bounds on `startTime`, inclusive at both ends.
    ///
    /// A calendar-month filter overrides both explicit ranges; otherwise the
    /// date range and the time range are intersected.
    fn time_bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        if self.month.is_some() || self.year.is_some() {
            let year = self.year.unwrap_or_else(|| now.year());
            let month = self.month.unwrap_or(1);
            return match month_range(year, month) {
                Some((start, end)) => (Some(start), Some(end)),
                None => (None, None),
            };
        }

        let lower = match (self.start_date, self.start_time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let upper = match (self.end_date, self.end_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        (lower, upper)
    }

    fn matches(
        &self,
        record: &HazardRecord,
        lower: Option<DateTime<Utc>>,
        upper: Option<DateTime<Utc>>,
    ) -> bool {
        if let Some(sources) = &self.source {
            if !sources.contains(&record.source) {
                return false;
            }
        }
        if let Some(types) = &self.hazard_type {
            if !types.contains(&record.hazard_type) {
                return false;
            }
        }
        if let Some(states) = &self.state {
            if !states.iter().any(|s| s == &record.state) {
                return false;
            }
        }
        if let Some(severities) = &self.severity {
            if !severities.contains(&record.severity) {
                return false;
            }
        }
        if let Some(lower) = lower {
            if record.start_time < lower {
                return false;
            }
        }
        if let Some(upper) = upper {
            if record.start_time > upper {
                return false;
            }
        }
        true
    }
}

/// Parse a scalar-or-comma-separated-list parameter.
fn parse_list<T>(value: Option<&str>, key: &str) -> Result<Option<Vec<T>>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return Ok(None);
    };
    let mut parsed = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        parsed.push(
            part.parse::<T>()
                .map_err(|e| Error::InvalidFilter(format!("{}: {}", key, e)))?,
        );
    }
    Ok(if parsed.is_empty() { None } else { Some(parsed) })
}

/// Parse an RFC 3339 instant, or a bare date as UTC midnight.
fn parse_instant(value: Option<&str>, key: &str) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(start_of_day) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(start_of_day.and_utc()));
        }
    }
    Err(Error::InvalidFilter(format!(
        "{}: '{}' is not a date or RFC 3339 timestamp",
        key, value
    )))
}

/// First and last instant (23:59:59) of a calendar month.
fn month_range(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last_day = next_month.pred_opt()?;
    let start = first_day.and_hms_opt(0, 0, 0)?.and_utc();
    let end = last_day.and_hms_opt(23, 59, 59)?.and_utc();
    Some((start, end))
}

// ============================================================================
// Response Types
// ============================================================================

/// Location details bundled with each returned item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub state: String,
    pub area_desc: String,
    pub lat: f64,
    pub lng: f64,
    /// GeoJSON order: `[lng, lat]`.
    pub coordinates: [f64; 2],
}

/// One hazard in the response, with location fields grouped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardItem {
    pub id: String,
    pub source: HazardSource,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub title: String,
    pub description: String,
    pub instructions: Option<String>,
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Location,
    pub url: String,
    pub raw: serde_json::Value,
}

impl From<HazardRecord> for HazardItem {
    fn from(record: HazardRecord) -> Self {
        Self {
            id: record.id,
            source: record.source,
            hazard_type: record.hazard_type,
            title: record.title,
            description: record.description,
            instructions: record.instructions,
            severity: record.severity,
            start_time: record.start_time,
            end_time: record.end_time,
            location: Location {
                state: record.state,
                area_desc: record.area_desc,
                lat: record.lat,
                lng: record.lng,
                coordinates: [record.lng, record.lat],
            },
            url: record.url,
            raw: record.raw,
        }
    }
}

/// Per-source counts over the filtered (unlimited) set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub nws: usize,
    pub usgs: usize,
}

/// Query result: counts, per-source breakdown, filter echo, items.
#[derive(Debug, Clone, Serialize)]
pub struct DisasterData {
    /// Matching records, ignoring the limit.
    pub total: usize,
    /// Returned records.
    pub count: usize,
    pub sources: SourceCounts,
    pub filters: HazardFilter,
    pub items: Vec<HazardItem>,
}

// ============================================================================
// Query Engine
// ============================================================================

/// Evaluate a filter against a snapshot and build the response payload.
///
/// Items come back `startTime`-descending and capped at the filter's limit;
/// `total` and `sources` are computed before the cap.
pub fn run_query(
    records: Vec<HazardRecord>,
    filter: &HazardFilter,
    now: DateTime<Utc>,
) -> DisasterData {
    let (lower, upper) = filter.time_bounds(now);

    let mut matched: Vec<HazardRecord> = records
        .into_iter()
        .filter(|r| filter.matches(r, lower, upper))
        .collect();
    matched.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    let total = matched.len();
    let mut sources = SourceCounts::default();
    for record in &matched {
        match record.source {
            HazardSource::Nws => sources.nws += 1,
            HazardSource::Usgs => sources.usgs += 1,
        }
    }

    let items: Vec<HazardItem> = matched
        .into_iter()
        .take(filter.limit)
        .map(HazardItem::from)
        .collect();

    DisasterData {
        total,
        count: items.len(),
        sources,
        filters: filter.clone(),
        items,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_record(
        id: &str,
        source: HazardSource,
        hazard_type: HazardType,
        severity: Severity,
        start_time: DateTime<Utc>,
    ) -> HazardRecord {
        HazardRecord {
            id: id.to_string(),
            source,
            hazard_type,
            title: format!("{} — TX", hazard_type),
            description: "desc".to_string(),
            instructions: None,
            severity,
            start_time,
            end_time: start_time,
            state: "TX".to_string(),
            area_desc: "Travis County, TX".to_string(),
            lat: 30.3,
            lng: -97.7,
            url: "https://example.com".to_string(),
            raw: serde_json::json!({}),
            fetched_at: start_time,
        }
    }

    fn seeded_snapshot(now: DateTime<Utc>) -> Vec<HazardRecord> {
        vec![
            make_record("nws-1", HazardSource::Nws, HazardType::Tornado, Severity::Extreme, now),
            make_record("nws-2", HazardSource::Nws, HazardType::Flood, Severity::Severe, now),
            make_record("nws-3", HazardSource::Nws, HazardType::Wildfire, Severity::Minor, now),
            make_record("usgs-1", HazardSource::Usgs, HazardType::Earthquake, Severity::Moderate, now),
            make_record("usgs-2", HazardSource::Usgs, HazardType::Earthquake, Severity::Extreme, now),
        ]
    }

    fn filter_from(params: DisasterParams) -> HazardFilter {
        HazardFilter::from_params(params).unwrap()
    }

    #[test]
    fn test_no_filters_returns_everything() {
        let now = Utc::now();
        let data = run_query(seeded_snapshot(now), &filter_from(DisasterParams::default()), now);
        assert_eq!(data.total, 5);
        assert_eq!(data.count, 5);
        assert_eq!(data.sources, SourceCounts { nws: 3, usgs: 2 });
    }

    #[test]
    fn test_severity_filter_counts_per_source() {
        let now = Utc::now();
        let params = DisasterParams {
            severity: Some("extreme".to_string()),
            ..Default::default()
        };
        let data = run_query(seeded_snapshot(now), &filter_from(params), now);
        assert_eq!(data.count, 2);
        assert_eq!(data.total, 2);
        assert_eq!(data.sources, SourceCounts { nws: 1, usgs: 1 });
    }

    #[test]
    fn test_source_and_type_filter_returns_only_seismic() {
        let now = Utc::now();
        let params = DisasterParams {
            source: Some("usgs".to_string()),
            hazard_type: Some("earthquake".to_string()),
            ..Default::default()
        };
        let data = run_query(seeded_snapshot(now), &filter_from(params), now);
        assert_eq!(data.count, 2);
        assert!(data.items.iter().all(|i| i.source == HazardSource::Usgs));
    }

    #[test]
    fn test_csv_list_filter() {
        let now = Utc::now();
        let params = DisasterParams {
            severity: Some("extreme,severe".to_string()),
            ..Default::default()
        };
        let data = run_query(seeded_snapshot(now), &filter_from(params), now);
        assert_eq!(data.count, 3);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let params = DisasterParams {
            severity: Some("catastrophic".to_string()),
            ..Default::default()
        };
        assert!(HazardFilter::from_params(params).is_err());
    }

    #[test]
    fn test_invalid_month_rejected() {
        let params = DisasterParams {
            month: Some(13),
            ..Default::default()
        };
        assert!(HazardFilter::from_params(params).is_err());
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        let defaulted = filter_from(DisasterParams::default());
        assert_eq!(defaulted.limit, DEFAULT_LIMIT);

        let clamped = filter_from(DisasterParams {
            limit: Some(500),
            ..Default::default()
        });
        assert_eq!(clamped.limit, MAX_LIMIT);

        let zero = filter_from(DisasterParams {
            limit: Some(0),
            ..Default::default()
        });
        assert_eq!(zero.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_limit_caps_items_not_counts() {
        let now = Utc::now();
        let params = DisasterParams {
            limit: Some(2),
            ..Default::default()
        };
        let data = run_query(seeded_snapshot(now), &filter_from(params), now);
        assert_eq!(data.count, 2);
        assert_eq!(data.total, 5);
        assert_eq!(data.sources, SourceCounts { nws: 3, usgs: 2 });
    }

    #[test]
    fn test_items_sorted_start_time_descending() {
        let now = Utc::now();
        let records = vec![
            make_record("a", HazardSource::Nws, HazardType::Flood, Severity::Minor, now - chrono::Duration::hours(2)),
            make_record("b", HazardSource::Nws, HazardType::Flood, Severity::Minor, now),
            make_record("c", HazardSource::Nws, HazardType::Flood, Severity::Minor, now - chrono::Duration::hours(1)),
        ];
        let data = run_query(records, &filter_from(DisasterParams::default()), now);
        let ids: Vec<&str> = data.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let now = Utc::now();
        let inside = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let records = vec![
            make_record("in", HazardSource::Nws, HazardType::Flood, Severity::Minor, inside),
            make_record("out", HazardSource::Nws, HazardType::Flood, Severity::Minor, now),
        ];
        let params = DisasterParams {
            start_date: Some("2024-03-01".to_string()),
            end_date: Some("2024-03-31T23:59:59Z".to_string()),
            ..Default::default()
        };
        let data = run_query(records, &filter_from(params), now);
        assert_eq!(data.count, 1);
        assert_eq!(data.items[0].id, "in");
    }

    #[test]
    fn test_date_and_time_ranges_intersect() {
        let filter = filter_from(DisasterParams {
            start_date: Some("2024-03-01".to_string()),
            start_time: Some("2024-03-10T00:00:00Z".to_string()),
            end_date: Some("2024-03-31T23:59:59Z".to_string()),
            end_time: Some("2024-03-20T00:00:00Z".to_string()),
            ..Default::default()
        });
        let (lower, upper) = filter.time_bounds(Utc::now());
        assert_eq!(lower, Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()));
        assert_eq!(upper, Some(Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_month_year_overrides_explicit_ranges() {
        let filter = filter_from(DisasterParams {
            start_date: Some("2024-06-01".to_string()),
            end_date: Some("2024-06-30".to_string()),
            month: Some(3),
            year: Some(2024),
            ..Default::default()
        });
        let (lower, upper) = filter.time_bounds(Utc::now());
        assert_eq!(lower, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(upper, Some(Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_year_alone_defaults_month_to_january() {
        let filter = filter_from(DisasterParams {
            year: Some(2024),
            ..Default::default()
        });
        let (lower, upper) = filter.time_bounds(Utc::now());
        assert_eq!(lower, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(upper, Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_month_alone_defaults_to_current_year() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let filter = filter_from(DisasterParams {
            month: Some(12),
            ..Default::default()
        });
        let (lower, upper) = filter.time_bounds(now);
        assert_eq!(lower, Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()));
        assert_eq!(upper, Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_bad_date_rejected() {
        let params = DisasterParams {
            start_date: Some("not-a-date".to_string()),
            ..Default::default()
        };
        assert!(HazardFilter::from_params(params).is_err());
    }

    #[test]
    fn test_item_location_shape() {
        let now = Utc::now();
        let data = run_query(seeded_snapshot(now), &filter_from(DisasterParams::default()), now);
        let item = &data.items[0];
        assert_eq!(item.location.coordinates, [item.location.lng, item.location.lat]);

        let value = serde_json::to_value(item).unwrap();
        assert!(value["location"].get("areaDesc").is_some());
        assert!(value.get("startTime").is_some());
    }

    #[test]
    fn test_filter_echo_includes_clamped_limit() {
        let filter = filter_from(DisasterParams {
            limit: Some(500),
            severity: Some("extreme".to_string()),
            ..Default::default()
        });
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["limit"], 200);
        assert_eq!(value["severity"][0], "extreme");
        assert!(value.get("startDate").is_none());
    }
}
