//! Lateral rendering offsets: greedy conflict coloring so co-routed lines
//! never draw on top of each other.

use std::collections::{HashMap, HashSet};

use crate::identifiers::{RouteId, StationId};
use crate::topology::StationIndex;

/// Slot -> signed lateral offset. Slot 0 is centered; subsequent slots
/// alternate sides with increasing magnitude.
pub const OFFSET_SLOTS: [f64; 7] = [0.0, -2.0, 2.0, -4.0, 4.0, -6.0, 6.0];

/// The lateral offset for a slot. Slots past the table (more than seven
/// mutually conflicting lines) fall back to centered.
pub fn lateral_offset(slot: usize) -> f64 {
    OFFSET_SLOTS.get(slot).copied().unwrap_or(0.0)
}

/// Assign each line the smallest slot not already taken by any other line
/// sharing at least one station with it.
///
/// Deterministic for a fixed `order`; the greedy coloring is
/// order-dependent, which is why the processing order is part of the
/// engine contract. Must be rerun in full whenever stop sets change.
pub fn assign_offsets(
    order: &[RouteId],
    route_stops: &HashMap<RouteId, HashSet<StationId>>,
    index: &StationIndex,
) -> HashMap<RouteId, usize> {
    let mut slots: HashMap<RouteId, usize> = HashMap::new();

    for route in order {
        let Some(stops) = route_stops.get(route) else {
            continue;
        };

        let mut conflicting: HashSet<usize> = HashSet::new();
        for stop in stops {
            for other in index.stop_routes(stop) {
                if let Some(slot) = slots.get(other) {
                    conflicting.insert(*slot);
                }
            }
        }

        let mut slot = 0;
        while conflicting.contains(&slot) {
            slot += 1;
        }
        slots.insert(route.clone(), slot);
    }

    slots
}
