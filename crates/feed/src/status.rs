//! Service status payload: per-direction segment quality records.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    pub routes: Vec<RouteStatusPayload>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteStatusPayload {
    pub id: String,
    #[serde(default)]
    pub north: Vec<SegmentStatusPayload>,
    #[serde(default)]
    pub south: Vec<SegmentStatusPayload>,
}

/// One degraded (or healthy) span of a line in one direction.
///
/// `first_stops`/`last_stops` are raw feed stop ids bounding the span, in
/// feed order; the engine normalizes orientation and strips the platform
/// suffix before matching them against station codes.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentStatusPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    pub first_stops: Vec<String>,
    pub last_stops: Vec<String>,
    #[serde(default)]
    pub slow: bool,
    #[serde(default)]
    pub delayed: bool,
    #[serde(default)]
    pub headway_gap: bool,
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub travel_time: Option<f64>,
    #[serde(default)]
    pub max_actual_headway: Option<f64>,
    #[serde(default)]
    pub max_scheduled_headway: Option<f64>,
}

impl StatusPayload {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
