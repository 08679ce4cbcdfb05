//! Selection state driven by the (external) UI. Pure data: it only
//! affects which derived items consumers see, never how they compute.

use crate::catalog::Direction;
use crate::identifiers::{RouteId, StationId, TripId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripSelection {
    pub trip: TripId,
    pub route: RouteId,
    pub direction: Direction,
}

/// What the user is currently looking at. The default selects every line
/// and no individual station or trip.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    /// The active train filter. `None` means "all lines"; an explicit list
    /// (possibly empty) dims everything outside it.
    pub trains: Option<Vec<RouteId>>,
    pub stations: Vec<StationId>,
    pub trip: Option<TripSelection>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn single_train(route: RouteId) -> Self {
        Self {
            trains: Some(vec![route]),
            ..Default::default()
        }
    }

    pub fn includes_route(&self, route: &RouteId) -> bool {
        match &self.trains {
            None => true,
            Some(trains) => trains.contains(route),
        }
    }

    /// The single filtered line, when the filter is exactly one line.
    pub fn single_filter(&self) -> Option<&RouteId> {
        match self.trains.as_deref() {
            Some([route]) => Some(route),
            _ => None,
        }
    }

    pub fn filter_len(&self) -> Option<usize> {
        self.trains.as_ref().map(Vec::len)
    }

    pub fn is_trip_selected(&self, trip: &TripId) -> bool {
        self.trip.as_ref().is_some_and(|t| &t.trip == trip)
    }
}
