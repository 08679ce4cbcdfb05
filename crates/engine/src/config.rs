//! Engine configuration: the fixed line registry order and the small
//! amount of network-specific curation the renderer needs.

use std::collections::HashSet;

use crate::identifiers::{RouteId, StationId};

/// A shuttle-style line that physically reverses direction at a small set
/// of stations: its recorded "north" stop there functions as "south" and
/// vice versa, and the stop classifier swaps its membership accordingly.
#[derive(Clone, Debug)]
pub struct ShuttleReversal {
    pub route: RouteId,
    pub stations: HashSet<StationId>,
}

impl ShuttleReversal {
    pub fn applies_at(&self, station: &StationId) -> bool {
        self.stations.contains(station)
    }
}

/// Static engine configuration.
///
/// `line_order` fixes the offset-assignment processing order; the greedy
/// coloring is order-dependent, so reordering changes visual output. Lines
/// absent from the list are appended in sorted-id order so every route in
/// the feed still gets a slot deterministically.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub line_order: Vec<RouteId>,
    pub shuttle_reversal: Option<ShuttleReversal>,
    /// Stations whose labels win placement priority when their lines are
    /// selected (terminals and major hubs, curated).
    pub prioritized_stations: HashSet<StationId>,
    /// Secondary curated tier, used when a single line is selected.
    pub major_stations: HashSet<StationId>,
}
