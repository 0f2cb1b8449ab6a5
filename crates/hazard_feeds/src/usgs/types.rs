//! Raw USGS event payload types.

use serde::Deserialize;

/// One GeoJSON feature from the event query.
#[derive(Debug, Default, Deserialize)]
pub struct QuakeFeature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Option<QuakeProperties>,
    #[serde(default)]
    pub geometry: Option<QuakeGeometry>,
}

/// Event properties as sent by the provider. Times are epoch milliseconds.
#[derive(Debug, Default, Deserialize)]
pub struct QuakeProperties {
    #[serde(default)]
    pub mag: Option<f64>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Event geometry: `coordinates` is `[lng, lat, depth_km]`.
#[derive(Debug, Default, Deserialize)]
pub struct QuakeGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}
