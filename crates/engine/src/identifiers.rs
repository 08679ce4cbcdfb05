//! Type-safe identifiers for stations, routes, and trips.
//!
//! All identifiers wrap `Arc<str>` for cheap cloning.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Feed stop ids carry a direction/platform suffix after the station code
/// (`"A09N"` is the northbound platform of station `A09`). Everything past
/// this length is stripped before matching against the catalog.
pub const STATION_CODE_LEN: usize = 3;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

impl_identifier!(StationId);
impl_identifier!(RouteId);
impl_identifier!(TripId);

impl StationId {
    /// Build a station id from a raw feed stop id by truncating to the
    /// station-code prefix.
    pub fn from_stop_id(stop_id: &str) -> Self {
        let end = stop_id
            .char_indices()
            .nth(STATION_CODE_LEN)
            .map(|(i, _)| i)
            .unwrap_or(stop_id.len());
        Self::new(&stop_id[..end])
    }
}
