//! Static station catalog payload.
//!
//! Keyed by 3-character station code. Each station carries its coordinate,
//! display names, an optional fixed marker bearing, and per-direction
//! adjacency: the next stations a track physically continues to, with the
//! intermediate shape coordinates of that track segment (an empty list
//! means the shape is unknown and the segment renders straight).

use std::collections::HashMap;

use serde::Deserialize;

/// The full station catalog as served, keyed by station code.
pub type StationCatalogPayload = HashMap<String, StationPayload>;

#[derive(Debug, Clone, Deserialize)]
pub struct StationPayload {
    pub name: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    /// Fixed marker heading, for stations whose icon orientation is curated
    /// by hand rather than derived from track geometry.
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Northbound adjacency: next station code -> intermediate shape points
    /// as `[longitude, latitude]` pairs.
    #[serde(default)]
    pub north: HashMap<String, Vec<[f64; 2]>>,
    /// Southbound adjacency, same layout.
    #[serde(default)]
    pub south: HashMap<String, Vec<[f64; 2]>>,
}

impl StationPayload {
    /// A station the engine can place on the map: finite coordinates.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

/// Parse a station catalog from JSON.
pub fn catalog_from_json(json: &str) -> crate::Result<StationCatalogPayload> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "S01": {
                "name": "First St",
                "longitude": -74.0,
                "latitude": 40.7,
                "north": {"S02": [[-74.001, 40.701]]}
            },
            "S02": {
                "name": "Second St",
                "secondary_name": "Uptown",
                "longitude": -74.01,
                "latitude": 40.71,
                "bearing": 29.0
            }
        }"#;

        let catalog = catalog_from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = &catalog["S01"];
        assert!(first.is_valid());
        assert_eq!(first.north["S02"], vec![[-74.001, 40.701]]);
        assert!(first.bearing.is_none());

        let second = &catalog["S02"];
        assert_eq!(second.secondary_name.as_deref(), Some("Uptown"));
        assert_eq!(second.bearing, Some(29.0));
    }

    #[test]
    fn test_non_finite_coordinate_is_invalid() {
        let station = StationPayload {
            name: "Broken".into(),
            secondary_name: None,
            longitude: f64::NAN,
            latitude: 40.7,
            bearing: None,
            north: HashMap::new(),
            south: HashMap::new(),
        };
        assert!(!station.is_valid());
    }
}
