//! # subway-engine
//!
//! Route geometry and real-time position engine for a transit map.
//!
//! The engine turns a sparse station-adjacency graph plus a periodically
//! refreshed feed (route topology, service status, stop-time estimates)
//! into plain geometric features: line polylines with collision-avoiding
//! lateral offsets, problem-section overlays, interpolated vehicle
//! positions with headings, and classified stop markers. It never touches
//! the screen; the rendering surface consumes whatever it returns.
//!
//! ## Example
//!
//! ```
//! use subway_engine::prelude::*;
//! use subway_feed::{StationPayload, TopologyPayload, RoutePayload, DirectionalRoutings};
//! use std::collections::HashMap;
//!
//! let mut stations = HashMap::new();
//! stations.insert("S01".to_string(), StationPayload {
//!     name: "First St".into(),
//!     secondary_name: None,
//!     longitude: -74.0,
//!     latitude: 40.70,
//!     bearing: None,
//!     north: HashMap::from([("S02".to_string(), vec![])]),
//!     south: HashMap::new(),
//! });
//! stations.insert("S02".to_string(), StationPayload {
//!     name: "Second St".into(),
//!     secondary_name: None,
//!     longitude: -74.0,
//!     latitude: 40.71,
//!     bearing: None,
//!     north: HashMap::new(),
//!     south: HashMap::new(),
//! });
//!
//! let mut engine = Engine::new(EngineConfig::default(), &stations).unwrap();
//! let topology = TopologyPayload {
//!     checksum: None,
//!     routes: HashMap::from([("A".to_string(), RoutePayload {
//!         name: "A".into(),
//!         color: "#2850ad".into(),
//!         routings: DirectionalRoutings {
//!             north: vec![vec!["S01N".to_string(), "S02N".to_string()]],
//!             south: vec![],
//!         },
//!     })]),
//! };
//! assert!(engine.apply_topology(&topology));
//!
//! let lines = engine.line_features(&Selection::default());
//! assert_eq!(lines.len(), 1);
//! let polyline = &lines[0].polylines[0];
//! assert_eq!(polyline.first().map(|p| p.y()), Some(40.70));
//! assert_eq!(polyline.last().map(|p| p.y()), Some(40.71));
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod features;
pub mod geometry;
pub mod identifiers;
pub mod offsets;
pub mod path;
pub mod polyline;
pub mod positions;
pub mod problems;
pub mod selection;
pub mod stops;
pub mod topology;

// Re-exports for convenience
pub mod prelude {
    pub use crate::catalog::{Direction, Station, StationCatalog};
    pub use crate::config::{EngineConfig, ShuttleReversal};
    pub use crate::engine::{Engine, EngineError};
    pub use crate::features::{LineFeature, OverlayFeature, TripPathFeature};
    pub use crate::identifiers::{RouteId, StationId, TripId};
    pub use crate::positions::VehicleFeature;
    pub use crate::problems::{ProblemSection, ServiceStatus};
    pub use crate::selection::{Selection, TripSelection};
    pub use crate::stops::{StopFeature, StopKind};
}

pub use prelude::*;
