//! The engine proper: owns the catalog, the current topology snapshot and
//! feed-derived state, and answers feature queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use geo::Point;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Direction, StationCatalog};
use crate::config::EngineConfig;
use crate::features::{LineFeature, OverlayFeature, TripPathFeature};
use crate::geometry;
use crate::identifiers::{RouteId, StationId};
use crate::offsets::{assign_offsets, lateral_offset};
use crate::path::PathResolver;
use crate::polyline::PolylineBuilder;
use crate::positions::{
    self, DirectionalArrivals, StopTimeSample, TripArrivals, VehicleFeature,
};
use crate::problems::{extract_problem_sections, ProblemSection, ServiceStatus};
use crate::selection::{Selection, TripSelection};
use crate::stops::{self, StopFeature};
use crate::topology::TopologySnapshot;
use subway_feed::{ArrivalsPayload, StationCatalogPayload, StatusPayload, TopologyPayload};

/// Opacity applied to lines outside the active train filter.
const DIMMED_OPACITY: f64 = 0.1;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("station catalog contains no usable stations")]
    EmptyCatalog,
}

/// Owns all derived state. Feed payloads go in through the `apply_*`
/// methods; render-ready features come out of the query methods.
///
/// Queries that walk geometry take `&mut self` because they share the
/// path-resolution cache with topology ingestion.
pub struct Engine {
    config: EngineConfig,
    catalog: StationCatalog,
    resolver: PathResolver,
    snapshot: TopologySnapshot,
    slots: HashMap<RouteId, usize>,
    line_geometry: HashMap<RouteId, Vec<Vec<Point>>>,
    problem_sections: HashMap<RouteId, Vec<ProblemSection>>,
    arrivals: HashMap<RouteId, DirectionalArrivals>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        stations: &StationCatalogPayload,
    ) -> Result<Self, EngineError> {
        let catalog = StationCatalog::from_payload(stations);
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        info!(stations = catalog.len(), "engine initialized");

        Ok(Self {
            config,
            catalog,
            resolver: PathResolver::new(),
            snapshot: TopologySnapshot::default(),
            slots: HashMap::new(),
            line_geometry: HashMap::new(),
            problem_sections: HashMap::new(),
            arrivals: HashMap::new(),
        })
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// The current topology snapshot (empty before the first
    /// [`apply_topology`](Self::apply_topology)).
    pub fn snapshot(&self) -> &TopologySnapshot {
        &self.snapshot
    }

    // ========================================================================
    // Feed ingestion
    // ========================================================================

    /// Ingest a topology payload, rebuilding every derived structure:
    /// the snapshot, lateral offsets, line geometry, and the passed-through
    /// index. Returns `false` without rebuilding anything when the
    /// payload's checksum matches the current snapshot.
    pub fn apply_topology(&mut self, payload: &TopologyPayload) -> bool {
        if let (Some(current), Some(incoming)) = (&self.snapshot.checksum, &payload.checksum) {
            if current == incoming {
                debug!(checksum = %incoming, "topology unchanged, skipping rebuild");
                return false;
            }
        }

        let mut snapshot = TopologySnapshot::build(&self.catalog, payload, &self.config);
        self.resolver.invalidate();
        self.slots = assign_offsets(&snapshot.order, &snapshot.route_stops, &snapshot.index);

        let mut line_geometry: HashMap<RouteId, Vec<Vec<Point>>> = HashMap::new();
        let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);
        for route in &snapshot.order {
            let Some(routings) = snapshot.processed_routings.get(route) else {
                continue;
            };
            let polylines: Vec<Vec<Point>> = routings
                .iter()
                .map(|routing| builder.build_full(routing))
                .collect();
            line_geometry.insert(route.clone(), polylines);
        }

        // Any station coordinate a rendered polyline runs through marks a
        // pass: stations skipped by an express routing still sit on its
        // track.
        for (route, polylines) in &line_geometry {
            for polyline in polylines {
                for point in polyline {
                    if let Some(station) = self.catalog.station_at(*point) {
                        let station = station.clone();
                        snapshot.index.mark_passed(station, route.clone());
                    }
                }
            }
        }

        info!(routes = snapshot.order.len(), "topology applied");
        self.snapshot = snapshot;
        self.line_geometry = line_geometry;
        true
    }

    /// Ingest a service status payload, replacing all problem sections.
    pub fn apply_status(&mut self, payload: &StatusPayload) {
        self.problem_sections = payload
            .routes
            .iter()
            .map(|route| (RouteId::new(&route.id), extract_problem_sections(route)))
            .collect();
        debug!(routes = self.problem_sections.len(), "status applied");
    }

    /// Ingest an arrivals payload, replacing all trip stop-time samples.
    /// Trips with missing ids or non-finite estimates are dropped.
    pub fn apply_arrivals(&mut self, payload: &ArrivalsPayload) {
        let mut arrivals: HashMap<RouteId, DirectionalArrivals> = HashMap::new();

        for (raw_route, route_arrivals) in &payload.routes {
            let route = RouteId::new(raw_route);
            let normalize = |trips: &[subway_feed::TripPayload]| {
                trips
                    .iter()
                    .filter(|trip| {
                        if trip.is_valid() {
                            return true;
                        }
                        warn!(route = %route, trip = %trip.id, "dropping invalid trip");
                        false
                    })
                    .map(|trip| TripArrivals {
                        id: trip.id.as_str().into(),
                        samples: trip
                            .arrival_times
                            .iter()
                            .map(|sample| StopTimeSample {
                                station: StationId::from_stop_id(&sample.stop_id),
                                time: sample.estimated_time,
                            })
                            .collect(),
                    })
                    .collect::<Vec<_>>()
            };

            let north = normalize(&route_arrivals.trains.north);
            let south = normalize(&route_arrivals.trains.south);
            arrivals.insert(route, DirectionalArrivals { north, south });
        }

        self.arrivals = arrivals;
    }

    // ========================================================================
    // Feature queries
    // ========================================================================

    /// Full line geometry, one feature per route in processing order.
    pub fn line_features(&self, selection: &Selection) -> Vec<LineFeature> {
        self.snapshot
            .order
            .iter()
            .filter_map(|route_id| {
                let route = self.snapshot.routes.get(route_id)?;
                let polylines = self.line_geometry.get(route_id)?;
                Some(LineFeature {
                    route: route_id.clone(),
                    color: route.color.clone(),
                    offset: self.route_offset(route_id),
                    opacity: self.route_opacity(route_id, selection),
                    polylines: polylines.clone(),
                })
            })
            .collect()
    }

    /// Problem-section overlays for one status category, skipping routes
    /// with nothing to draw.
    pub fn overlay_features(
        &mut self,
        status: ServiceStatus,
        selection: &Selection,
    ) -> Vec<OverlayFeature> {
        let mut features = Vec::new();
        let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);

        for route in &self.snapshot.order {
            let sections: Vec<ProblemSection> = self
                .problem_sections
                .get(route)
                .into_iter()
                .flatten()
                .filter(|section| section.matches(status))
                .cloned()
                .collect();
            if sections.is_empty() {
                continue;
            }

            let polylines: Vec<Vec<Point>> = self
                .snapshot
                .processed_routings
                .get(route)
                .into_iter()
                .flatten()
                .flat_map(|routing| builder.build_problem_spans(routing, &sections))
                .collect();
            if polylines.is_empty() {
                continue;
            }

            features.push(OverlayFeature {
                route: route.clone(),
                status,
                color: status.color(),
                dash_spacing: status.dash_spacing(),
                offset: self
                    .slots
                    .get(route)
                    .copied()
                    .map(lateral_offset)
                    .unwrap_or(0.0),
                opacity: match &selection.trains {
                    None => 1.0,
                    Some(trains) if trains.contains(route) => 1.0,
                    Some(_) => DIMMED_OPACITY,
                },
                polylines,
            });
        }

        features
    }

    /// Interpolated positions of every active trip at `now`.
    pub fn vehicle_features(
        &mut self,
        now: DateTime<Utc>,
        selection: &Selection,
        view_bearing: f64,
    ) -> Vec<VehicleFeature> {
        let now_secs = epoch_secs(now);
        let locations = positions::locate_trains(
            now_secs,
            &self.arrivals,
            &self.snapshot.routings_by_direction,
            &self.catalog,
        );

        let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);
        locations
            .iter()
            .filter_map(|location| {
                let route = self.snapshot.routes.get(&location.route)?;
                positions::vehicle_feature(
                    now_secs,
                    location,
                    route,
                    &mut builder,
                    selection,
                    view_bearing,
                )
            })
            .collect()
    }

    /// Classified stop markers under the current selection. With a trip
    /// selected (and known), markers light along that trip instead.
    pub fn stop_features(&mut self, selection: &Selection, view_bearing: f64) -> Vec<StopFeature> {
        if let Some(trip_selection) = &selection.trip {
            if let Some(trip) = self.find_trip(trip_selection).cloned() {
                let trip_stations: Vec<StationId> =
                    trip.samples.iter().map(|s| s.station.clone()).collect();
                let line = self.trip_line(&trip_stations, trip_selection.direction);
                return stops::stop_features_for_trip(
                    &self.catalog,
                    &self.snapshot,
                    &self.config,
                    selection,
                    &trip_selection.route,
                    trip_selection.direction,
                    &trip_stations,
                    &line,
                );
            }
        }

        let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);
        stops::stop_features(
            &self.catalog,
            &self.snapshot,
            &self.config,
            &mut builder,
            selection,
            view_bearing,
        )
    }

    /// The selected trip's remaining path, from its interpolated position
    /// (when it can be located) to the end of its routing.
    pub fn trip_path(
        &mut self,
        now: DateTime<Utc>,
        selection: &Selection,
    ) -> Option<TripPathFeature> {
        let trip_selection = selection.trip.as_ref()?;
        let trip = self.find_trip(trip_selection).cloned()?;
        let trip_stations: Vec<StationId> =
            trip.samples.iter().map(|s| s.station.clone()).collect();

        let coords = self.trip_line(&trip_stations, trip_selection.direction);
        if coords.len() < 2 {
            return None;
        }

        let now_secs = epoch_secs(now);
        let locations = positions::locate_trains(
            now_secs,
            &self.arrivals,
            &self.snapshot.routings_by_direction,
            &self.catalog,
        );
        let position = locations
            .iter()
            .find(|l| l.trip == trip_selection.trip)
            .and_then(|location| {
                let route = self.snapshot.routes.get(&location.route)?;
                let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);
                let feature = positions::vehicle_feature(
                    now_secs,
                    location,
                    route,
                    &mut builder,
                    selection,
                    0.0,
                )?;
                Some(feature.position)
            });

        let coordinates = match position {
            Some(position) => {
                let along = geometry::nearest_distance_along(&coords, position);
                geometry::slice_from(&coords, along)
            }
            None => coords,
        };

        let route = self.snapshot.routes.get(&trip_selection.route)?;
        Some(TripPathFeature {
            trip: trip_selection.trip.clone(),
            route: trip_selection.route.clone(),
            color: route.color.clone(),
            offset: self.route_offset(&trip_selection.route),
            coordinates,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn route_offset(&self, route: &RouteId) -> f64 {
        self.slots
            .get(route)
            .copied()
            .map(lateral_offset)
            .unwrap_or(0.0)
    }

    fn route_opacity(&self, route: &RouteId, selection: &Selection) -> f64 {
        if selection.includes_route(route) {
            1.0
        } else {
            DIMMED_OPACITY
        }
    }

    fn find_trip(&self, selection: &TripSelection) -> Option<&TripArrivals> {
        self.arrivals
            .get(&selection.route)?
            .get(selection.direction)
            .iter()
            .find(|trip| trip.id == selection.trip)
    }

    /// A trip's coordinate path oriented in travel order. Geometry is
    /// always resolved northbound, so southbound trips build the reversed
    /// station list and flip the result.
    fn trip_line(&mut self, trip_stations: &[StationId], direction: Direction) -> Vec<Point> {
        let northbound: Vec<StationId> = match direction {
            Direction::North => trip_stations.to_vec(),
            Direction::South => trip_stations.iter().rev().cloned().collect(),
        };
        let mut builder = PolylineBuilder::new(&self.catalog, &mut self.resolver);
        let mut coords = builder.build_full(&northbound);
        if direction == Direction::South {
            coords.reverse();
        }
        coords
    }
}

fn epoch_secs(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_rejected() {
        let stations = StationCatalogPayload::new();
        assert!(matches!(
            Engine::new(EngineConfig::default(), &stations),
            Err(EngineError::EmptyCatalog)
        ));
    }
}
