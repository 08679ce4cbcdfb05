//! Render-ready geometric features the engine hands to its consumer.
//!
//! Everything here is plain data the rendering surface styles as it sees
//! fit. Coordinates are longitude/latitude points; `offset` is the lateral
//! line offset in screen units at base zoom (renderers typically scale it
//! with zoom).

use geo::Point;

use crate::identifiers::{RouteId, TripId};
use crate::problems::ServiceStatus;

/// One line's full geometry: a multi-polyline covering every distinct
/// routing variant, northbound-oriented.
#[derive(Clone, Debug)]
pub struct LineFeature {
    pub route: RouteId,
    pub color: String,
    pub offset: f64,
    pub opacity: f64,
    pub polylines: Vec<Vec<Point>>,
}

/// The degraded sub-spans of one line for one status category, drawn
/// dashed on top of its line.
#[derive(Clone, Debug)]
pub struct OverlayFeature {
    pub route: RouteId,
    pub status: ServiceStatus,
    pub color: &'static str,
    /// Dash gap hint for the overlay stroke.
    pub dash_spacing: f64,
    pub offset: f64,
    pub opacity: f64,
    pub polylines: Vec<Vec<Point>>,
}

/// The remaining path of one selected trip, from its interpolated position
/// to the end of its routing.
#[derive(Clone, Debug)]
pub struct TripPathFeature {
    pub trip: TripId,
    pub route: RouteId,
    pub color: String,
    pub offset: f64,
    pub coordinates: Vec<Point>,
}
