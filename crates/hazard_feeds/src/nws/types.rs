//! Raw NWS alert payload types.
//!
//! Tolerant intermediate shapes for the GeoJSON active-alerts feed. Every
//! field is optional; the adapter decides what is required and skips the
//! rest. Malformed features are dropped one at a time, never fatally.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One GeoJSON feature from the alert collection.
#[derive(Debug, Default, Deserialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Option<AlertProperties>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// Alert properties as sent by the provider.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub certainty: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub area_desc: Option<String>,
    #[serde(default)]
    pub onset: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effective: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends: Option<DateTime<Utc>>,
}

/// Alert geometry: a point or a polygon, anything else is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// `[lng, lat]`, possibly with a trailing altitude.
        coordinates: Vec<f64>,
    },
    Polygon {
        /// Rings of `[lng, lat]` vertices; only the first ring is used.
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Other,
}

impl Geometry {
    /// Representative `(lat, lng)` for the geometry.
    ///
    /// Points are used directly. Polygons use the unweighted arithmetic mean
    /// of the first ring's vertices, an approximation rather than a true
    /// centroid.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } if coordinates.len() >= 2 => {
                Some((coordinates[1], coordinates[0]))
            }
            Geometry::Polygon { coordinates } => {
                let ring = coordinates.first()?;
                let mut lat = 0.0;
                let mut lng = 0.0;
                let mut count = 0usize;
                for vertex in ring {
                    if vertex.len() >= 2 {
                        lng += vertex[0];
                        lat += vertex[1];
                        count += 1;
                    }
                }
                if count == 0 {
                    None
                } else {
                    Some((lat / count as f64, lng / count as f64))
                }
            }
            _ => None,
        }
    }
}
