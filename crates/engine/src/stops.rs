//! Stop classification and marker features.
//!
//! Each station renders as one icon chosen from how the lines passing
//! through relate to the lines actually stopping, per direction, plus an
//! opacity/priority pair that drives label dimming and placement.

use geo::Point;

use crate::catalog::{Direction, Station, StationCatalog};
use crate::config::EngineConfig;
use crate::geometry;
use crate::identifiers::{RouteId, StationId};
use crate::polyline::PolylineBuilder;
use crate::selection::Selection;
use crate::topology::{StationIndex, TopologySnapshot};

/// Look-ahead (and look-behind) along the track used to derive a marker
/// heading, in kilometers.
const BEARING_PROBE_KM: f64 = 0.01;

/// Marker icon category for one station.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopKind {
    /// Every passing line stops, in both directions.
    ExpressStop,
    /// The filtered line stops northbound only.
    AllUptownTrains,
    /// The filtered line stops southbound only.
    AllDowntownTrains,
    /// Some passing lines stop, northbound only.
    UptownOnly,
    /// Some passing lines stop, southbound only.
    DowntownOnly,
    /// Every passing line stops northbound; southbound service is mixed.
    UptownAllTrains,
    /// Every passing line stops southbound; northbound service is mixed.
    DowntownAllTrains,
    /// Mixed service, both directions.
    Circle,
    /// Nothing stops here; lines only pass through.
    Cross,
}

impl StopKind {
    pub fn icon_name(self) -> &'static str {
        match self {
            StopKind::ExpressStop => "express-stop",
            StopKind::AllUptownTrains => "all-uptown-trains",
            StopKind::AllDowntownTrains => "all-downtown-trains",
            StopKind::UptownOnly => "uptown-only",
            StopKind::DowntownOnly => "downtown-only",
            StopKind::UptownAllTrains => "uptown-all-trains",
            StopKind::DowntownAllTrains => "downtown-all-trains",
            StopKind::Circle => "circle",
            StopKind::Cross => "cross",
        }
    }

    /// Directional icons are drawn rotated to the track heading; the
    /// symmetric ones never are.
    fn is_directional(self) -> bool {
        !matches!(self, StopKind::Circle | StopKind::ExpressStop | StopKind::Cross)
    }
}

/// Classify one station's marker.
///
/// A shuttle line that physically reverses at this station has its north
/// and south stop memberships swapped before classification, so the icon
/// reflects the direction the vehicle actually travels.
pub fn classify(
    station: &StationId,
    index: &StationIndex,
    config: &EngineConfig,
    selection: &Selection,
) -> StopKind {
    let mut north = index.direction_stops(Direction::North, station);
    let mut south = index.direction_stops(Direction::South, station);

    if let Some(shuttle) = config
        .shuttle_reversal
        .as_ref()
        .filter(|s| s.applies_at(station))
    {
        let was_north = north.remove(&shuttle.route);
        let was_south = south.remove(&shuttle.route);
        if was_north {
            south.insert(shuttle.route.clone());
        }
        if was_south {
            north.insert(shuttle.route.clone());
        }
    }

    if let Some(selected) = selection.single_filter() {
        return match (south.contains(selected), north.contains(selected)) {
            (true, true) => StopKind::ExpressStop,
            (true, false) => StopKind::AllDowntownTrains,
            (false, true) => StopKind::AllUptownTrains,
            (false, false) if index.stop_count(station) == 0 => StopKind::Cross,
            (false, false) => StopKind::Circle,
        };
    }

    if index.stop_count(station) == 0 {
        return StopKind::Cross;
    }

    let passed: Vec<&RouteId> = index.passed_routes(station).collect();
    let all_south = passed.iter().all(|r| south.contains(*r));
    let all_north = passed.iter().all(|r| north.contains(*r));

    if all_south && all_north {
        return StopKind::ExpressStop;
    }
    if north.is_empty() {
        return if all_south {
            StopKind::AllDowntownTrains
        } else {
            StopKind::DowntownOnly
        };
    }
    if south.is_empty() {
        return if all_north {
            StopKind::AllUptownTrains
        } else {
            StopKind::UptownOnly
        };
    }
    if all_south {
        return StopKind::DowntownAllTrains;
    }
    if all_north {
        return StopKind::UptownAllTrains;
    }
    StopKind::Circle
}

/// Render-ready stop marker.
#[derive(Clone, Debug)]
pub struct StopFeature {
    pub station: StationId,
    pub name: String,
    pub kind: StopKind,
    pub opacity: f64,
    /// Label placement priority, lower wins.
    pub priority: u8,
    pub bearing: f64,
    pub location: Point,
}

/// Build the marker set for the whole catalog under the current selection.
/// Stations are emitted in sorted-id order.
pub fn stop_features(
    catalog: &StationCatalog,
    snapshot: &TopologySnapshot,
    config: &EngineConfig,
    builder: &mut PolylineBuilder,
    selection: &Selection,
    view_bearing: f64,
) -> Vec<StopFeature> {
    let mut stations: Vec<&Station> = catalog.stations().collect();
    stations.sort_by(|a, b| a.id.cmp(&b.id));

    stations
        .into_iter()
        .map(|station| {
            let kind = classify(&station.id, &snapshot.index, config, selection);
            let (opacity, priority) = opacity_and_priority(station, snapshot, config, selection);

            let mut bearing = station.bearing;
            if bearing.is_none() && kind.is_directional() {
                bearing = derive_bearing(station, snapshot, builder);
            }
            let bearing = match bearing {
                Some(b) => b,
                None if kind == StopKind::Cross => view_bearing,
                None => 0.0,
            };

            StopFeature {
                station: station.id.clone(),
                name: display_name(&station.name),
                kind,
                opacity,
                priority,
                bearing,
                location: station.location,
            }
        })
        .collect()
}

fn opacity_and_priority(
    station: &Station,
    snapshot: &TopologySnapshot,
    config: &EngineConfig,
    selection: &Selection,
) -> (f64, u8) {
    let id = &station.id;
    let index = &snapshot.index;

    let any_selected_stops = match &selection.trains {
        None => index.stop_count(id) > 0,
        Some(trains) => trains.iter().any(|t| index.stops_here(id, t)),
    };
    let station_selected = selection.stations.contains(id);
    // The default filter is the full line registry: non-empty.
    let filter_active = selection.filter_len().map_or(true, |n| n > 0);
    let single = selection.single_filter();

    if !any_selected_stops
        && !station_selected
        && (single.is_some() || index.stop_count(id) > 0)
    {
        return (0.1, 10);
    }
    if !selection.stations.is_empty() && !station_selected {
        return (0.5, 7);
    }
    if let Some(route) = single {
        let is_terminal = snapshot
            .processed_routings
            .get(route)
            .is_some_and(|routings| {
                routings
                    .iter()
                    .any(|r| r.first() == Some(id) || r.last() == Some(id))
            });
        if is_terminal {
            return (1.0, 1);
        }
    }
    if filter_active && any_selected_stops && config.prioritized_stations.contains(id) {
        return (1.0, 3);
    }
    if single.is_some() && any_selected_stops && config.major_stations.contains(id) {
        return (1.0, 4);
    }
    (1.0, 5)
}

/// Marker heading from the first processed routing through this station:
/// toward the next northbound stop when one exists, otherwise along the
/// approach from the previous stop.
fn derive_bearing(
    station: &Station,
    snapshot: &TopologySnapshot,
    builder: &mut PolylineBuilder,
) -> Option<f64> {
    let routing = snapshot
        .order
        .iter()
        .filter_map(|route| snapshot.processed_routings.get(route))
        .flatten()
        .find(|routing| routing.contains(&station.id))?;
    if routing.len() < 2 {
        return None;
    }

    let i = routing.iter().position(|s| s == &station.id)?;
    if i < routing.len() - 1 {
        let pair = [station.id.clone(), routing[i + 1].clone()];
        let line = builder.build_full(&pair);
        let ahead = geometry::point_along(&line, BEARING_PROBE_KM)?;
        Some(geometry::bearing(station.location, ahead))
    } else {
        let pair = [routing[i - 1].clone(), station.id.clone()];
        let line = builder.build_full(&pair);
        let length = geometry::line_length_km(&line);
        let behind = geometry::point_along(&line, length - BEARING_PROBE_KM)?;
        Some(geometry::bearing(behind, station.location))
    }
}

/// Marker set when one trip is selected: its stops light up along the
/// travel direction, everything else dims.
///
/// `trip_stations` are the trip's stop codes and `line` its remaining
/// coordinate path oriented in travel order (empty when unknown).
#[allow(clippy::too_many_arguments)]
pub fn stop_features_for_trip(
    catalog: &StationCatalog,
    snapshot: &TopologySnapshot,
    config: &EngineConfig,
    selection: &Selection,
    trip_route: &RouteId,
    direction: Direction,
    trip_stations: &[StationId],
    line: &[Point],
) -> Vec<StopFeature> {
    let mut stations: Vec<&Station> = catalog.stations().collect();
    stations.sort_by(|a, b| a.id.cmp(&b.id));

    let line_length = geometry::line_length_km(line);
    let directional_kind = |direction: Direction| match direction {
        Direction::North => StopKind::AllUptownTrains,
        Direction::South => StopKind::AllDowntownTrains,
    };

    stations
        .into_iter()
        .map(|station| {
            let mut bearing = station.bearing;
            let mut opacity = 0.1;
            let mut priority = 10;
            let mut kind = classify(&station.id, &snapshot.index, config, selection);

            if trip_stations.contains(&station.id) {
                opacity = 1.0;
                priority = if trip_stations.last() == Some(&station.id) {
                    1
                } else {
                    5
                };
                kind = directional_kind(direction);
                if config
                    .shuttle_reversal
                    .as_ref()
                    .is_some_and(|s| &s.route == trip_route && s.applies_at(&station.id))
                {
                    kind = directional_kind(match direction {
                        Direction::North => Direction::South,
                        Direction::South => Direction::North,
                    });
                }

                if bearing.is_none() && line.len() > 1 && line_length > 0.0 {
                    bearing = if line[0] == station.location {
                        geometry::point_along(line, BEARING_PROBE_KM)
                            .map(|ahead| geometry::bearing(station.location, ahead))
                    } else {
                        let along = geometry::nearest_distance_along(line, station.location);
                        geometry::point_along(line, along - BEARING_PROBE_KM)
                            .map(|behind| geometry::bearing(behind, station.location))
                    };
                    // Derived headings always pair with the uptown glyph;
                    // rotation alone conveys the travel direction.
                    kind = StopKind::AllUptownTrains;
                }
            } else {
                bearing = Some(0.0);
            }

            StopFeature {
                station: station.id.clone(),
                name: display_name(&station.name),
                kind,
                opacity,
                priority,
                bearing: bearing.unwrap_or(0.0),
                location: station.location,
            }
        })
        .collect()
}

fn display_name(raw: &str) -> String {
    raw.replace(" - ", "–")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShuttleReversal;
    use crate::topology::StationIndex;
    use std::collections::HashSet;

    fn mark(
        index: &mut StationIndex,
        station: &str,
        route: &str,
        directions: &[Direction],
    ) {
        let station = StationId::new(station);
        let route = RouteId::new(route);
        for direction in directions {
            index.mark_stop_for_tests(*direction, &station, &route);
        }
    }

    fn pass(index: &mut StationIndex, station: &str, route: &str) {
        index.mark_passed(StationId::new(station), RouteId::new(route));
    }

    fn classify_plain(index: &StationIndex, station: &str) -> StopKind {
        classify(
            &StationId::new(station),
            index,
            &EngineConfig::default(),
            &Selection::all(),
        )
    }

    #[test]
    fn test_cross_when_nothing_stops() {
        let mut index = StationIndex::default();
        pass(&mut index, "S01", "A");
        assert_eq!(classify_plain(&index, "S01"), StopKind::Cross);
    }

    #[test]
    fn test_express_stop_when_all_passing_lines_stop_both_ways() {
        let mut index = StationIndex::default();
        mark(&mut index, "S01", "A", &Direction::ALL);
        mark(&mut index, "S01", "B", &Direction::ALL);
        pass(&mut index, "S01", "A");
        pass(&mut index, "S01", "B");
        assert_eq!(classify_plain(&index, "S01"), StopKind::ExpressStop);
    }

    #[test]
    fn test_one_directional_tiers() {
        let mut index = StationIndex::default();
        mark(&mut index, "S01", "A", &[Direction::South]);
        pass(&mut index, "S01", "A");
        assert_eq!(classify_plain(&index, "S01"), StopKind::AllDowntownTrains);

        // A second passing line that never stops downgrades the marker.
        pass(&mut index, "S01", "B");
        assert_eq!(classify_plain(&index, "S01"), StopKind::DowntownOnly);
    }

    #[test]
    fn test_mixed_direction_tiers() {
        let mut index = StationIndex::default();
        mark(&mut index, "S01", "A", &Direction::ALL);
        mark(&mut index, "S01", "B", &[Direction::South]);
        pass(&mut index, "S01", "A");
        pass(&mut index, "S01", "B");
        // Every passing line stops southbound, not northbound.
        assert_eq!(classify_plain(&index, "S01"), StopKind::DowntownAllTrains);

        mark(&mut index, "S01", "C", &[Direction::North]);
        pass(&mut index, "S01", "C");
        assert_eq!(classify_plain(&index, "S01"), StopKind::Circle);
    }

    #[test]
    fn test_single_filter_follows_selected_line_only() {
        let mut index = StationIndex::default();
        mark(&mut index, "S01", "A", &[Direction::North]);
        mark(&mut index, "S01", "B", &Direction::ALL);
        pass(&mut index, "S01", "A");
        pass(&mut index, "S01", "B");

        let selection = Selection::single_train(RouteId::new("A"));
        let kind = classify(
            &StationId::new("S01"),
            &index,
            &EngineConfig::default(),
            &selection,
        );
        assert_eq!(kind, StopKind::AllUptownTrains);

        // A station the filtered line misses entirely renders as circle.
        let mut other = StationIndex::default();
        mark(&mut other, "S02", "B", &Direction::ALL);
        let kind = classify(
            &StationId::new("S02"),
            &other,
            &EngineConfig::default(),
            &selection,
        );
        assert_eq!(kind, StopKind::Circle);
    }

    #[test]
    fn test_shuttle_reversal_swaps_directions() {
        let mut index = StationIndex::default();
        mark(&mut index, "S01", "M", &[Direction::South]);
        pass(&mut index, "S01", "M");

        let config = EngineConfig {
            shuttle_reversal: Some(ShuttleReversal {
                route: RouteId::new("M"),
                stations: HashSet::from([StationId::new("S01")]),
            }),
            ..Default::default()
        };
        let kind = classify(&StationId::new("S01"), &index, &config, &Selection::all());
        assert_eq!(kind, StopKind::AllUptownTrains);
    }

    #[test]
    fn test_display_name_condenses_separators() {
        assert_eq!(display_name("Court Sq - 23 St"), "Court Sq–23 St");
        assert_eq!(display_name("Plain St"), "Plain St");
    }
}
