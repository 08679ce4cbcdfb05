//! # subway-feed
//!
//! Wire-format payload types for the transit feed.
//!
//! The engine never fetches anything itself; whatever polls the feed hands
//! these already-materialized payloads over. Deserialization is lenient
//! where the feed is lenient (optional fields default), and each payload
//! offers a `retain_valid` pass that drops entries the engine could not
//! use, so malformed records never reach the geometry code.

pub mod arrivals;
pub mod stations;
pub mod status;
pub mod topology;

pub use arrivals::{ArrivalsPayload, DirectionalTrips, RouteArrivalsPayload, StopTimePayload, TripPayload};
pub use stations::{StationCatalogPayload, StationPayload};
pub use status::{RouteStatusPayload, SegmentStatusPayload, StatusPayload};
pub use topology::{DirectionalRoutings, RoutePayload, TopologyPayload};

/// Errors raised while decoding a feed payload.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
