//! Per-refresh derived topology: normalized routings and the station
//! index (which lines stop where, in which direction, and which lines
//! merely pass through).
//!
//! A snapshot is built whole from one topology payload and replaced, never
//! patched, so consumers can never observe a half-updated graph.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::debug;

use crate::catalog::{Direction, StationCatalog};
use crate::config::EngineConfig;
use crate::identifiers::{RouteId, StationId, STATION_CODE_LEN};
use subway_feed::TopologyPayload;

#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub color: String,
}

/// Normalized routing variants per direction, station codes only.
#[derive(Clone, Debug, Default)]
pub struct RoutingsByDirection {
    pub north: Vec<Vec<StationId>>,
    pub south: Vec<Vec<StationId>>,
}

impl RoutingsByDirection {
    pub fn get(&self, direction: Direction) -> &[Vec<StationId>] {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }
}

/// Derived per-station sets, rebuilt wholesale each refresh.
#[derive(Clone, Debug, Default)]
pub struct StationIndex {
    north_stops: HashMap<StationId, HashSet<RouteId>>,
    south_stops: HashMap<StationId, HashSet<RouteId>>,
    stops: HashMap<StationId, HashSet<RouteId>>,
    passed: HashMap<StationId, HashSet<RouteId>>,
}

impl StationIndex {
    pub fn serves(&self, direction: Direction, station: &StationId, route: &RouteId) -> bool {
        let map = match direction {
            Direction::North => &self.north_stops,
            Direction::South => &self.south_stops,
        };
        map.get(station).is_some_and(|set| set.contains(route))
    }

    pub fn direction_stops(&self, direction: Direction, station: &StationId) -> HashSet<RouteId> {
        let map = match direction {
            Direction::North => &self.north_stops,
            Direction::South => &self.south_stops,
        };
        map.get(station).cloned().unwrap_or_default()
    }

    pub fn stops_here(&self, station: &StationId, route: &RouteId) -> bool {
        self.stops
            .get(station)
            .is_some_and(|set| set.contains(route))
    }

    pub fn stop_count(&self, station: &StationId) -> usize {
        self.stops.get(station).map_or(0, HashSet::len)
    }

    pub fn stop_routes(&self, station: &StationId) -> impl Iterator<Item = &RouteId> {
        self.stops.get(station).into_iter().flatten()
    }

    pub fn passed_routes(&self, station: &StationId) -> impl Iterator<Item = &RouteId> {
        self.passed.get(station).into_iter().flatten()
    }

    pub fn mark_passed(&mut self, station: StationId, route: RouteId) {
        self.passed.entry(station).or_default().insert(route);
    }

    #[cfg(test)]
    pub(crate) fn mark_stop_for_tests(
        &mut self,
        direction: Direction,
        station: &StationId,
        route: &RouteId,
    ) {
        self.mark_stop(direction, station, route);
    }

    fn mark_stop(&mut self, direction: Direction, station: &StationId, route: &RouteId) {
        let map = match direction {
            Direction::North => &mut self.north_stops,
            Direction::South => &mut self.south_stops,
        };
        map.entry(station.clone()).or_default().insert(route.clone());
        self.stops
            .entry(station.clone())
            .or_default()
            .insert(route.clone());
    }
}

/// One topology version: routes, normalized routings, and the station
/// index derived from them.
#[derive(Clone, Debug, Default)]
pub struct TopologySnapshot {
    pub routes: HashMap<RouteId, Route>,
    /// Offset-assignment processing order: the configured registry order
    /// filtered to present routes, then any remaining routes in sorted-id
    /// order.
    pub order: Vec<RouteId>,
    /// All routing variants, northbound-oriented and deduplicated.
    pub processed_routings: HashMap<RouteId, Vec<Vec<StationId>>>,
    pub routings_by_direction: HashMap<RouteId, RoutingsByDirection>,
    pub route_stops: HashMap<RouteId, HashSet<StationId>>,
    pub index: StationIndex,
    pub checksum: Option<String>,
}

impl TopologySnapshot {
    pub fn build(
        catalog: &StationCatalog,
        payload: &TopologyPayload,
        config: &EngineConfig,
    ) -> Self {
        let mut snapshot = TopologySnapshot {
            checksum: payload.checksum.clone(),
            ..Default::default()
        };

        for (raw_id, route) in &payload.routes {
            let id = RouteId::new(raw_id);
            snapshot.routes.insert(
                id.clone(),
                Route {
                    id: id.clone(),
                    name: route.name.clone(),
                    color: route.color.clone(),
                },
            );
            snapshot.route_stops.entry(id.clone()).or_default();

            let north = normalize_routings(
                catalog,
                &route.routings.north,
                Direction::North,
                &id,
                &mut snapshot,
            );
            let south = normalize_routings(
                catalog,
                &route.routings.south,
                Direction::South,
                &id,
                &mut snapshot,
            );

            // Northbound-oriented union of every variant, deduplicated.
            let processed: Vec<Vec<StationId>> = north
                .iter()
                .cloned()
                .chain(south.iter().map(|routing| {
                    let mut reversed = routing.clone();
                    reversed.reverse();
                    reversed
                }))
                .unique()
                .collect();

            snapshot.processed_routings.insert(id.clone(), processed);
            snapshot
                .routings_by_direction
                .insert(id.clone(), RoutingsByDirection { north, south });
        }

        snapshot.order = processing_order(&snapshot.routes, config);
        debug!(
            routes = snapshot.routes.len(),
            "built topology snapshot"
        );
        snapshot
    }
}

/// Keep only routings whose every raw stop id carries this direction's
/// platform letter, truncate to station codes, register stop membership,
/// and drop codes the catalog does not know.
fn normalize_routings(
    catalog: &StationCatalog,
    raw: &[Vec<String>],
    direction: Direction,
    route: &RouteId,
    snapshot: &mut TopologySnapshot,
) -> Vec<Vec<StationId>> {
    raw.iter()
        .filter(|routing| {
            routing.iter().all(|stop_id| {
                stop_id.chars().nth(STATION_CODE_LEN) == Some(direction.platform_letter())
            })
        })
        .map(|routing| {
            routing
                .iter()
                .filter_map(|stop_id| {
                    let station = StationId::from_stop_id(stop_id);
                    if !catalog.contains(&station) {
                        return None;
                    }
                    snapshot.index.mark_stop(direction, &station, route);
                    snapshot
                        .route_stops
                        .entry(route.clone())
                        .or_default()
                        .insert(station.clone());
                    Some(station)
                })
                .collect()
        })
        .collect()
}

fn processing_order(routes: &HashMap<RouteId, Route>, config: &EngineConfig) -> Vec<RouteId> {
    let mut order: Vec<RouteId> = config
        .line_order
        .iter()
        .filter(|id| routes.contains_key(id))
        .cloned()
        .collect();
    let leftovers: Vec<RouteId> = routes
        .keys()
        .filter(|id| !order.contains(id))
        .cloned()
        .sorted()
        .collect();
    order.extend(leftovers);
    order
}
