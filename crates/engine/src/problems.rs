//! Normalization of per-direction service-quality segments into stop-range
//! descriptors the polyline builder can match against routings.

use crate::catalog::Direction;
use crate::identifiers::StationId;
use subway_feed::{RouteStatusPayload, SegmentStatusPayload};

/// Service-quality category an overlay can be drawn for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Delay,
    Slow,
    LongHeadway,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [
        ServiceStatus::Delay,
        ServiceStatus::Slow,
        ServiceStatus::LongHeadway,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceStatus::Delay => "delay",
            ServiceStatus::Slow => "slow",
            ServiceStatus::LongHeadway => "long-headway",
        }
    }

    /// Overlay stroke color.
    pub fn color(self) -> &'static str {
        match self {
            ServiceStatus::Delay => "#ff8093",
            ServiceStatus::Slow => "#fbfb08",
            ServiceStatus::LongHeadway => "#dddddd",
        }
    }

    /// Dash gap hint for the overlay stroke.
    pub fn dash_spacing(self) -> f64 {
        match self {
            ServiceStatus::Delay => 5.0,
            ServiceStatus::Slow => 7.0,
            ServiceStatus::LongHeadway => 11.0,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A contiguous degraded stop-range of one line in one direction,
/// normalized to northbound rendering orientation and station codes.
#[derive(Clone, Debug)]
pub struct ProblemSection {
    pub direction: Direction,
    pub name: Option<String>,
    pub first_stops: Vec<StationId>,
    pub last_stops: Vec<StationId>,
    pub slow: bool,
    pub delayed: bool,
    pub headway_gap: bool,
}

impl ProblemSection {
    /// Southbound spans are described head-to-tail in the feed opposite to
    /// how they render, so their stop roles swap.
    pub fn from_segment(direction: Direction, segment: &SegmentStatusPayload) -> Self {
        let firsts = segment.first_stops.iter().map(|s| StationId::from_stop_id(s));
        let lasts = segment.last_stops.iter().map(|s| StationId::from_stop_id(s));
        let (first_stops, last_stops) = match direction {
            Direction::North => (firsts.collect(), lasts.collect()),
            Direction::South => (lasts.collect(), firsts.collect()),
        };

        Self {
            direction,
            name: segment.name.clone(),
            first_stops,
            last_stops,
            slow: segment.slow,
            delayed: segment.delayed,
            headway_gap: segment.headway_gap,
        }
    }

    pub fn matches(&self, status: ServiceStatus) -> bool {
        match status {
            ServiceStatus::Delay => self.delayed,
            ServiceStatus::Slow => self.slow,
            ServiceStatus::LongHeadway => self.headway_gap,
        }
    }
}

/// Normalize every segment of one route's status record, both directions.
pub fn extract_problem_sections(status: &RouteStatusPayload) -> Vec<ProblemSection> {
    status
        .north
        .iter()
        .map(|segment| ProblemSection::from_segment(Direction::North, segment))
        .chain(
            status
                .south
                .iter()
                .map(|segment| ProblemSection::from_segment(Direction::South, segment)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(first: &[&str], last: &[&str]) -> SegmentStatusPayload {
        SegmentStatusPayload {
            name: Some("test segment".into()),
            parent_name: None,
            first_stops: first.iter().map(|s| s.to_string()).collect(),
            last_stops: last.iter().map(|s| s.to_string()).collect(),
            slow: false,
            delayed: true,
            headway_gap: false,
            delay: None,
            travel_time: None,
            max_actual_headway: None,
            max_scheduled_headway: None,
        }
    }

    fn ids(raw: &[&str]) -> Vec<StationId> {
        raw.iter().map(|s| StationId::new(s)).collect()
    }

    #[test]
    fn test_north_extraction_only_truncates() {
        let section =
            ProblemSection::from_segment(Direction::North, &segment(&["A09N"], &["A02N", "A03N"]));
        assert_eq!(section.first_stops, ids(&["A09"]));
        assert_eq!(section.last_stops, ids(&["A02", "A03"]));
    }

    #[test]
    fn test_south_extraction_swaps_roles() {
        let raw = segment(&["A02S"], &["A09S"]);
        let section = ProblemSection::from_segment(Direction::South, &raw);
        assert_eq!(section.first_stops, ids(&["A09"]));
        assert_eq!(section.last_stops, ids(&["A02"]));
    }

    #[test]
    fn test_status_flag_matching() {
        let section = ProblemSection::from_segment(Direction::North, &segment(&["A09N"], &["A02N"]));
        assert!(section.matches(ServiceStatus::Delay));
        assert!(!section.matches(ServiceStatus::Slow));
        assert!(!section.matches(ServiceStatus::LongHeadway));
    }

    #[test]
    fn test_extract_covers_both_directions() {
        let status = RouteStatusPayload {
            id: "A".into(),
            north: vec![segment(&["A09N"], &["A02N"])],
            south: vec![segment(&["A02S"], &["A09S"])],
        };
        let sections = extract_problem_sections(&status);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].direction, Direction::North);
        assert_eq!(sections[1].direction, Direction::South);
        // Southbound roles swapped: both sections render A09 -> A02.
        assert_eq!(sections[0].first_stops, sections[1].first_stops);
        assert_eq!(sections[0].last_stops, sections[1].last_stops);
    }
}
