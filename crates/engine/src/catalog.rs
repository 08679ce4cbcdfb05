//! Static station catalog: the immutable base table of stations plus the
//! directed track adjacency between them.
//!
//! The catalog never changes after construction. Everything derived from
//! the refreshed topology (which lines stop where, which lines pass
//! through) lives in [`crate::topology::TopologySnapshot`] and is rebuilt
//! wholesale on every refresh.

use std::collections::{BTreeMap, HashMap};

use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::warn;

use crate::identifiers::StationId;
use subway_feed::StationCatalogPayload;

/// Travel direction along the network. Northbound sequences are the
/// canonical orientation for geometry; southbound renders as the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::North, Direction::South];

    /// The platform letter raw feed stop ids carry for this direction.
    pub fn platform_letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub secondary_name: Option<String>,
    pub location: Point,
    /// Curated fixed marker heading, when the catalog carries one.
    pub bearing: Option<f64>,
}

/// Adjacency: next station -> intermediate shape points of the track
/// segment (empty = shape unknown, render straight). `BTreeMap` keeps
/// neighbor iteration order stable so path search stays deterministic.
type Edges = HashMap<StationId, BTreeMap<StationId, Vec<Point>>>;

pub struct StationCatalog {
    stations: HashMap<StationId, Station>,
    north: Edges,
    south: Edges,
    locator: RTree<StationNode>,
}

impl StationCatalog {
    /// Build the catalog from the static payload. Stations with non-finite
    /// coordinates and edges pointing at unknown stations are dropped.
    pub fn from_payload(payload: &StationCatalogPayload) -> Self {
        let mut stations = HashMap::new();
        for (code, station) in payload {
            if !station.is_valid() {
                warn!(station = %code, "skipping station with invalid coordinates");
                continue;
            }
            let id = StationId::new(code);
            stations.insert(
                id.clone(),
                Station {
                    id,
                    name: station.name.clone(),
                    secondary_name: station.secondary_name.clone(),
                    location: Point::new(station.longitude, station.latitude),
                    bearing: station.bearing,
                },
            );
        }

        let ingest_edges = |raw: &HashMap<String, Vec<[f64; 2]>>, from: &StationId| {
            raw.iter()
                .filter_map(|(to, shape)| {
                    let to = StationId::new(to);
                    if !stations.contains_key(&to) {
                        warn!(from = %from, to = %to, "dropping edge to unknown station");
                        return None;
                    }
                    let shape = shape.iter().map(|c| Point::new(c[0], c[1])).collect();
                    Some((to, shape))
                })
                .collect::<BTreeMap<_, _>>()
        };

        let mut north: Edges = HashMap::new();
        let mut south: Edges = HashMap::new();
        for (code, station) in payload {
            let from = StationId::new(code);
            if !stations.contains_key(&from) {
                continue;
            }
            if !station.north.is_empty() {
                north.insert(from.clone(), ingest_edges(&station.north, &from));
            }
            if !station.south.is_empty() {
                south.insert(from.clone(), ingest_edges(&station.south, &from));
            }
        }

        let locator = RTree::bulk_load(
            stations
                .values()
                .map(|s| StationNode::new(s.location, s.id.clone()))
                .collect(),
        );

        Self {
            stations,
            north,
            south,
            locator,
        }
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.stations.contains_key(id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    fn edges(&self, direction: Direction) -> &Edges {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }

    /// The stored shape of the direct edge `from -> to`, if one exists.
    pub fn edge(&self, direction: Direction, from: &StationId, to: &StationId) -> Option<&[Point]> {
        self.edges(direction)
            .get(from)?
            .get(to)
            .map(Vec::as_slice)
    }

    /// Direct successors of `from`, in stable order.
    pub fn neighbors(
        &self,
        direction: Direction,
        from: &StationId,
    ) -> impl Iterator<Item = (&StationId, &[Point])> {
        self.edges(direction)
            .get(from)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(to, shape)| (to, shape.as_slice())))
    }

    /// The station sitting exactly at `point`, if any. Rendered polylines
    /// pass through station coordinates verbatim, so an exact-position
    /// lookup (with float-noise tolerance) identifies skip-through passes.
    pub fn station_at(&self, point: Point) -> Option<&StationId> {
        const EPSILON_2: f64 = 1e-18;
        self.locator
            .locate_within_distance([point.x(), point.y()], EPSILON_2)
            .next()
            .map(|node| &node.id)
    }
}

// ============================================================================
// Spatial node
// ============================================================================

struct StationNode {
    id: StationId,
    point: [f64; 2],
}

impl StationNode {
    fn new(location: Point, id: StationId) -> Self {
        Self {
            id,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StationNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}
