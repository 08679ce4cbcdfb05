//! Memoized depth-bounded path search over the station adjacency.
//!
//! Every line/trip render re-resolves overlapping station pairs, so
//! results are cached per `(direction, from, to)` for the lifetime of one
//! topology version. Failed searches are cached too; the cache is cleared
//! as one unit whenever the topology snapshot is replaced.

use std::collections::{HashMap, HashSet};

use geo::Point;
use tracing::debug;

use crate::catalog::{Direction, StationCatalog};
use crate::identifiers::StationId;

/// Hop bound for the recursive search. The graph is station-to-station
/// adjacency, so 12 hops comfortably covers any express skip-through span.
const MAX_HOPS: u32 = 12;

type CacheKey = (Direction, StationId, StationId);

/// Resolves the shape-point sequence strictly between two stations.
///
/// An empty cached vector marks a failed search; successful paths always
/// contain at least one coordinate (an empty direct-edge shape resolves to
/// the destination's own coordinate).
#[derive(Default)]
pub struct PathResolver {
    cache: HashMap<CacheKey, Vec<Point>>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The coordinates strictly between `from` and `to`, or `None` when no
    /// path exists within the hop bound.
    pub fn resolve(
        &mut self,
        catalog: &StationCatalog,
        direction: Direction,
        from: &StationId,
        to: &StationId,
    ) -> Option<Vec<Point>> {
        let mut visited = HashSet::new();
        self.search(catalog, direction, from, to, 0, &mut visited)
    }

    /// Drop every cached path. Must run whenever the topology snapshot is
    /// replaced; stale entries referencing superseded adjacency are a
    /// correctness bug.
    pub fn invalidate(&mut self) {
        debug!(entries = self.cache.len(), "clearing path cache");
        self.cache.clear();
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn search(
        &mut self,
        catalog: &StationCatalog,
        direction: Direction,
        from: &StationId,
        to: &StationId,
        depth: u32,
        visited: &mut HashSet<StationId>,
    ) -> Option<Vec<Point>> {
        if let Some(hit) = self
            .cache
            .get(&(direction, from.clone(), to.clone()))
        {
            return if hit.is_empty() {
                None
            } else {
                Some(hit.clone())
            };
        }

        if !visited.insert(from.clone()) {
            return None;
        }

        if let Some(shape) = catalog.edge(direction, from, to) {
            // Direct edge: stored shape verbatim, or the destination's own
            // coordinate when the shape is unknown.
            return Some(if shape.is_empty() {
                vec![catalog.station(to)?.location]
            } else {
                shape.to_vec()
            });
        }

        if depth >= MAX_HOPS {
            return None;
        }

        let neighbors: Vec<StationId> = catalog
            .neighbors(direction, from)
            .map(|(id, _)| id.clone())
            .collect();

        for neighbor in neighbors {
            let Some(tail) = self.search(catalog, direction, &neighbor, to, depth + 1, visited)
            else {
                continue;
            };
            let shape = catalog.edge(direction, from, &neighbor).unwrap_or(&[]);
            let mut result = if shape.is_empty() {
                vec![catalog.station(&neighbor)?.location]
            } else {
                let mut r = shape.to_vec();
                r.push(catalog.station(&neighbor)?.location);
                r
            };
            result.extend(tail);
            self.cache
                .insert((direction, from.clone(), to.clone()), result.clone());
            return Some(result);
        }

        self.cache
            .insert((direction, from.clone(), to.clone()), Vec::new());
        None
    }
}
