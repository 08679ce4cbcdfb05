//! Arrivals payload: estimated stop times for every active trip.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalsPayload {
    pub routes: HashMap<String, RouteArrivalsPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteArrivalsPayload {
    #[serde(default)]
    pub trains: DirectionalTrips,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionalTrips {
    #[serde(default)]
    pub north: Vec<TripPayload>,
    #[serde(default)]
    pub south: Vec<TripPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripPayload {
    pub id: String,
    /// Ordered along the trip; times are unix epoch seconds.
    #[serde(default)]
    pub arrival_times: Vec<StopTimePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimePayload {
    pub stop_id: String,
    pub estimated_time: f64,
}

impl TripPayload {
    /// A trip the engine can place: non-empty id and finite estimates.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && self
                .arrival_times
                .iter()
                .all(|sample| sample.estimated_time.is_finite())
    }
}

impl ArrivalsPayload {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Drop trips with missing ids or non-finite time estimates.
    pub fn retain_valid(&mut self) {
        for route in self.routes.values_mut() {
            route.trains.north.retain(TripPayload::is_valid);
            route.trains.south.retain(TripPayload::is_valid);
        }
    }
}
