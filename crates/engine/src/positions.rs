//! Vehicle position interpolation between scheduled stop-time samples.
//!
//! No GPS: a vehicle's position is derived purely from the estimated stop
//! times bounding the current moment, extrapolated when the feed carries
//! no reliable previous sample.

use std::collections::HashMap;

use geo::Point;
use itertools::Itertools;
use tracing::debug;

use crate::catalog::{Direction, StationCatalog};
use crate::geometry;
use crate::identifiers::{RouteId, StationId, TripId};
use crate::polyline::PolylineBuilder;
use crate::selection::Selection;
use crate::topology::{Route, RoutingsByDirection};

/// Assumed travel-time floor when synthesizing a missing previous sample,
/// in seconds. Keeps the progress denominator away from zero when the
/// next stop is imminent.
pub const SYNTHESIZED_TRAVEL_FLOOR_SECS: f64 = 420.0;

/// Distance past the interpolated position used to compute a forward
/// bearing, in kilometers.
const LOOK_AHEAD_KM: f64 = 0.01;

/// One (station, estimated time) pair of a trip. Times are unix epoch
/// seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct StopTimeSample {
    pub station: StationId,
    pub time: f64,
}

/// Ordered stop-time samples for one trip.
#[derive(Clone, Debug)]
pub struct TripArrivals {
    pub id: TripId,
    pub samples: Vec<StopTimeSample>,
}

#[derive(Clone, Debug, Default)]
pub struct DirectionalArrivals {
    pub north: Vec<TripArrivals>,
    pub south: Vec<TripArrivals>,
}

impl DirectionalArrivals {
    pub fn get(&self, direction: Direction) -> &[TripArrivals] {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }
}

/// A vehicle bounded by its previous and next scheduled stops.
#[derive(Clone, Debug)]
pub struct TrainLocation {
    pub route: RouteId,
    pub trip: TripId,
    pub direction: Direction,
    pub prev: StopTimeSample,
    pub next: StopTimeSample,
}

/// Derived render-ready vehicle state.
#[derive(Clone, Debug)]
pub struct VehicleFeature {
    pub route: RouteId,
    pub trip: TripId,
    pub direction: Direction,
    pub position: Point,
    /// Raw forward compass bearing; the renderer aligns it to the map.
    pub bearing: f64,
    /// Label glyph rotation hint for express variants, already corrected
    /// for the viewing bearing.
    pub text_rotation: f64,
    /// Label anchor offset perpendicular to travel, in the renderer's
    /// em-ish units, corrected for the viewing bearing.
    pub label_offset: [f64; 2],
    pub label: String,
    pub label_color: &'static str,
    pub icon: String,
    pub color: String,
    pub visible: bool,
}

/// Find every active trip's bounding stop pair at `now_secs`.
///
/// Trips with no future recognized stop are omitted (already completed);
/// trips whose history predates the feed horizon get a synthesized
/// previous sample, unless no routing pattern offers a recognized
/// predecessor for their next stop (they have not departed yet).
pub fn locate_trains(
    now_secs: f64,
    arrivals: &HashMap<RouteId, DirectionalArrivals>,
    routings: &HashMap<RouteId, RoutingsByDirection>,
    catalog: &StationCatalog,
) -> Vec<TrainLocation> {
    let mut locations = Vec::new();

    for route in arrivals.keys().sorted() {
        let directional = &arrivals[route];
        for direction in Direction::ALL {
            let patterns = routings
                .get(route)
                .map(|r| r.get(direction))
                .unwrap_or(&[]);

            for trip in directional.get(direction) {
                let Some(next_idx) = trip
                    .samples
                    .iter()
                    .position(|s| s.time > now_secs && catalog.contains(&s.station))
                else {
                    continue;
                };
                let next = trip.samples[next_idx].clone();

                let prev = trip.samples[..next_idx]
                    .iter()
                    .rev()
                    .find(|s| s.time <= now_secs && catalog.contains(&s.station))
                    .cloned();

                let prev = match prev {
                    Some(prev) => prev,
                    None => {
                        match synthesize_prev(now_secs, &next, patterns, catalog) {
                            Some(prev) => prev,
                            None => {
                                debug!(trip = %trip.id, "trip has not departed, omitting");
                                continue;
                            }
                        }
                    }
                };

                locations.push(TrainLocation {
                    route: route.clone(),
                    trip: trip.id.clone(),
                    direction,
                    prev,
                    next,
                });
            }
        }
    }

    locations
}

/// A trip with no usable history is assumed to be somewhere between its
/// next stop and the nearest recognized predecessor on a routing pattern
/// containing that stop, roughly mid-dwell: the synthesized departure
/// time doubles the remaining travel estimate, floored at
/// [`SYNTHESIZED_TRAVEL_FLOOR_SECS`].
fn synthesize_prev(
    now_secs: f64,
    next: &StopTimeSample,
    patterns: &[Vec<StationId>],
    catalog: &StationCatalog,
) -> Option<StopTimeSample> {
    let prev_station = patterns.iter().find_map(|pattern| {
        let idx = pattern.iter().position(|s| s == &next.station)?;
        pattern[..idx]
            .iter()
            .rev()
            .find(|s| catalog.contains(s))
            .cloned()
    })?;

    let time_diff = ((next.time - now_secs) * 2.0).max(SYNTHESIZED_TRAVEL_FLOOR_SECS);
    Some(StopTimeSample {
        station: prev_station,
        time: next.time - time_diff,
    })
}

/// Interpolate one located vehicle into a render-ready feature.
///
/// The progress fraction is deliberately unclamped (inconsistent clocks
/// can push it below 0 or past 1); the along-path position clamps to the
/// segment extent instead, so a marker never leaves its track.
pub fn vehicle_feature(
    now_secs: f64,
    location: &TrainLocation,
    route: &Route,
    builder: &mut PolylineBuilder,
    selection: &Selection,
    view_bearing: f64,
) -> Option<VehicleFeature> {
    let pair = match location.direction {
        Direction::North => [location.prev.station.clone(), location.next.station.clone()],
        Direction::South => [location.next.station.clone(), location.prev.station.clone()],
    };
    let mut line = builder.build_full(&pair);
    if location.direction == Direction::South {
        line.reverse();
    }
    if line.is_empty() {
        return None;
    }

    let length = geometry::line_length_km(&line);
    let span = location.next.time - location.prev.time;
    let progress = if span > 0.0 {
        (now_secs - location.prev.time) / span
    } else {
        1.0
    };
    let travelled = progress * length;

    let position = geometry::point_along(&line, travelled)?;
    let ahead = geometry::point_along(&line, travelled + LOOK_AHEAD_KM)?;
    let bearing = geometry::bearing(position, ahead);

    let express = route.name.ends_with('X');
    let text_rotation = if express {
        (bearing + 225.0) % 90.0 - 45.0 - view_bearing
    } else {
        0.0
    };
    let theta = (bearing - view_bearing).to_radians();

    let color_hex = route.color.trim_start_matches('#').to_lowercase();
    let icon = if express {
        format!("train-pos-x-{color_hex}")
    } else {
        format!("train-pos-{color_hex}")
    };
    let label = route
        .name
        .strip_suffix('X')
        .unwrap_or(&route.name)
        .to_string();
    let label_color = if route.color.eq_ignore_ascii_case("#fbbd08") {
        "#000000"
    } else {
        "#ffffff"
    };

    let visible = selection.is_trip_selected(&location.trip)
        || selection.includes_route(&location.route);

    Some(VehicleFeature {
        route: location.route.clone(),
        trip: location.trip.clone(),
        direction: location.direction,
        position,
        bearing,
        text_rotation,
        label_offset: [-0.3 * theta.sin(), 0.3 * theta.cos()],
        label,
        label_color,
        icon,
        color: route.color.clone(),
        visible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathResolver;
    use approx::assert_relative_eq;
    use std::collections::HashMap as StdHashMap;
    use subway_feed::{StationCatalogPayload, StationPayload};

    fn station(lon: f64, lat: f64, north: &[&str]) -> StationPayload {
        StationPayload {
            name: "Test".into(),
            secondary_name: None,
            longitude: lon,
            latitude: lat,
            bearing: None,
            north: north.iter().map(|id| (id.to_string(), vec![])).collect(),
            south: StdHashMap::new(),
        }
    }

    fn catalog() -> StationCatalog {
        let mut raw = StationCatalogPayload::new();
        raw.insert("S01".into(), station(-74.00, 40.70, &["S02"]));
        raw.insert("S02".into(), station(-74.00, 40.71, &["S03"]));
        raw.insert("S03".into(), station(-74.00, 40.72, &[]));
        StationCatalog::from_payload(&raw)
    }

    fn sample(station: &str, time: f64) -> StopTimeSample {
        StopTimeSample {
            station: StationId::new(station),
            time,
        }
    }

    fn route() -> Route {
        Route {
            id: RouteId::new("A"),
            name: "A".into(),
            color: "#2850ad".into(),
        }
    }

    fn routings(patterns: &[&[&str]]) -> HashMap<RouteId, RoutingsByDirection> {
        HashMap::from([(
            RouteId::new("A"),
            RoutingsByDirection {
                north: patterns
                    .iter()
                    .map(|p| p.iter().copied().map(StationId::new).collect())
                    .collect(),
                south: vec![],
            },
        )])
    }

    fn arrivals(trips: Vec<TripArrivals>) -> HashMap<RouteId, DirectionalArrivals> {
        HashMap::from([(
            RouteId::new("A"),
            DirectionalArrivals {
                north: trips,
                south: vec![],
            },
        )])
    }

    #[test]
    fn test_bounding_pair_found() {
        let catalog = catalog();
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S01", 100.0), sample("S02", 400.0), sample("S03", 700.0)],
        }]);
        let routings = routings(&[&["S01", "S02", "S03"]]);

        let located = locate_trains(250.0, &trips, &routings, &catalog);
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].prev, sample("S01", 100.0));
        assert_eq!(located[0].next, sample("S02", 400.0));
    }

    #[test]
    fn test_completed_trip_omitted() {
        let catalog = catalog();
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S01", 100.0), sample("S02", 200.0)],
        }]);
        let routings = routings(&[&["S01", "S02"]]);

        assert!(locate_trains(900.0, &trips, &routings, &catalog).is_empty());
    }

    #[test]
    fn test_unrecognized_next_station_skipped() {
        let catalog = catalog();
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S01", 100.0), sample("ZZZ", 400.0), sample("S03", 700.0)],
        }]);
        let routings = routings(&[&["S01", "S03"]]);

        let located = locate_trains(250.0, &trips, &routings, &catalog);
        assert_eq!(located[0].next, sample("S03", 700.0));
    }

    #[test]
    fn test_missing_prev_is_synthesized_with_floor() {
        let catalog = catalog();
        // Only a future sample: history predates the feed horizon.
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S02", 1060.0)],
        }]);
        let routings = routings(&[&["S01", "S02", "S03"]]);

        let located = locate_trains(1000.0, &trips, &routings, &catalog);
        assert_eq!(located.len(), 1);
        let prev = &located[0].prev;
        assert_eq!(prev.station, StationId::new("S01"));
        // 2 * 60s remaining < 420s floor.
        assert_relative_eq!(prev.time, 1060.0 - 420.0);
        assert!(prev.time <= located[0].next.time - SYNTHESIZED_TRAVEL_FLOOR_SECS);
    }

    #[test]
    fn test_synthesized_prev_doubles_long_remaining_time() {
        let catalog = catalog();
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S02", 1400.0)],
        }]);
        let routings = routings(&[&["S01", "S02"]]);

        let located = locate_trains(1000.0, &trips, &routings, &catalog);
        assert_relative_eq!(located[0].prev.time, 1400.0 - 800.0);
    }

    #[test]
    fn test_undeparted_trip_omitted() {
        let catalog = catalog();
        // Next stop is the head of the only routing: nothing precedes it.
        let trips = arrivals(vec![TripArrivals {
            id: TripId::new("t1"),
            samples: vec![sample("S01", 1100.0)],
        }]);
        let routings = routings(&[&["S01", "S02", "S03"]]);

        assert!(locate_trains(1000.0, &trips, &routings, &catalog).is_empty());
    }

    #[test]
    fn test_progress_endpoints_land_on_stations() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let location = TrainLocation {
            route: RouteId::new("A"),
            trip: TripId::new("t1"),
            direction: Direction::North,
            prev: sample("S01", 100.0),
            next: sample("S02", 400.0),
        };
        let route = route();
        let selection = Selection::all();

        let at_prev =
            vehicle_feature(100.0, &location, &route, &mut builder, &selection, 0.0).unwrap();
        assert_relative_eq!(at_prev.position.y(), 40.70, epsilon = 1e-9);

        let at_next =
            vehicle_feature(400.0, &location, &route, &mut builder, &selection, 0.0).unwrap();
        assert_relative_eq!(at_next.position.y(), 40.71, epsilon = 1e-9);
    }

    #[test]
    fn test_overrun_progress_clamps_to_segment_end() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let location = TrainLocation {
            route: RouteId::new("A"),
            trip: TripId::new("t1"),
            direction: Direction::North,
            prev: sample("S01", 100.0),
            next: sample("S02", 400.0),
        };

        let feature = vehicle_feature(
            10_000.0,
            &location,
            &route(),
            &mut builder,
            &Selection::all(),
            0.0,
        )
        .unwrap();
        assert_relative_eq!(feature.position.y(), 40.71, epsilon = 1e-9);
    }

    #[test]
    fn test_southbound_travel_reverses_geometry() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        // Southbound: the vehicle left S02 heading to S01.
        let location = TrainLocation {
            route: RouteId::new("A"),
            trip: TripId::new("t1"),
            direction: Direction::South,
            prev: sample("S02", 100.0),
            next: sample("S01", 400.0),
        };

        let feature = vehicle_feature(
            100.0,
            &location,
            &route(),
            &mut builder,
            &Selection::all(),
            0.0,
        )
        .unwrap();
        // Progress 0 sits at the southbound origin S02.
        assert_relative_eq!(feature.position.y(), 40.71, epsilon = 1e-9);
        // Heading south.
        assert_relative_eq!(feature.bearing.abs(), 180.0, epsilon = 1.0);
    }

    #[test]
    fn test_express_variant_marker_hints() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let location = TrainLocation {
            route: RouteId::new("7X"),
            trip: TripId::new("t1"),
            direction: Direction::North,
            prev: sample("S01", 100.0),
            next: sample("S02", 400.0),
        };
        let route = Route {
            id: RouteId::new("7X"),
            name: "7X".into(),
            color: "#b933ad".into(),
        };

        let feature = vehicle_feature(
            250.0,
            &location,
            &route,
            &mut builder,
            &Selection::all(),
            0.0,
        )
        .unwrap();
        assert_eq!(feature.label, "7");
        assert_eq!(feature.icon, "train-pos-x-b933ad");
        // Northbound bearing ~0 => (0 + 225) % 90 - 45 = 0.
        assert_relative_eq!(feature.text_rotation, 0.0, epsilon = 1.0);
    }

    #[test]
    fn test_yellow_lines_get_dark_labels() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let location = TrainLocation {
            route: RouteId::new("N"),
            trip: TripId::new("t1"),
            direction: Direction::North,
            prev: sample("S01", 100.0),
            next: sample("S02", 400.0),
        };
        let route = Route {
            id: RouteId::new("N"),
            name: "N".into(),
            color: "#FBBD08".into(),
        };

        let feature = vehicle_feature(
            250.0,
            &location,
            &route,
            &mut builder,
            &Selection::all(),
            0.0,
        )
        .unwrap();
        assert_eq!(feature.label_color, "#000000");
    }

    #[test]
    fn test_visibility_follows_selection() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let location = TrainLocation {
            route: RouteId::new("A"),
            trip: TripId::new("t1"),
            direction: Direction::North,
            prev: sample("S01", 100.0),
            next: sample("S02", 400.0),
        };
        let route = route();

        let other_line = Selection::single_train(RouteId::new("B"));
        let feature =
            vehicle_feature(250.0, &location, &route, &mut builder, &other_line, 0.0).unwrap();
        assert!(!feature.visible);

        let this_trip = Selection {
            trains: Some(vec![]),
            stations: vec![],
            trip: Some(crate::selection::TripSelection {
                trip: TripId::new("t1"),
                route: RouteId::new("A"),
                direction: Direction::North,
            }),
        };
        let feature =
            vehicle_feature(250.0, &location, &route, &mut builder, &this_trip, 0.0).unwrap();
        assert!(feature.visible);
    }
}
