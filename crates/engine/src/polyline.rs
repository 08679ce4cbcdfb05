//! Composes a line's rendered polyline from a station sequence, optionally
//! restricted to the sub-ranges covered by problem sections.

use geo::Point;

use crate::catalog::{Direction, StationCatalog};
use crate::identifiers::StationId;
use crate::path::PathResolver;
use crate::problems::ProblemSection;

/// Walks station sequences into coordinate paths. Sequences are
/// northbound-oriented; southbound rendering reverses the result.
pub struct PolylineBuilder<'a> {
    catalog: &'a StationCatalog,
    resolver: &'a mut PathResolver,
}

impl<'a> PolylineBuilder<'a> {
    pub fn new(catalog: &'a StationCatalog, resolver: &'a mut PathResolver) -> Self {
        Self { catalog, resolver }
    }

    /// The full coordinate path along `sequence`: each station's own
    /// coordinate with the resolved intermediate shape spliced between
    /// consecutive pairs. An unresolvable pair renders as a gap-free
    /// straight jump (no intermediates), never an error.
    pub fn build_full(&mut self, sequence: &[StationId]) -> Vec<Point> {
        self.walk(sequence, &[]).full
    }

    /// Only the sub-paths covered by `sections`: one coordinate sequence
    /// per contiguous problem-affected span.
    pub fn build_problem_spans(
        &mut self,
        sequence: &[StationId],
        sections: &[ProblemSection],
    ) -> Vec<Vec<Point>> {
        // Sections with no geometric overlap with this sequence are
        // dropped before the walk; with none left there is nothing to do.
        let relevant = relevant_sections(sequence, sections);
        if relevant.is_empty() {
            return Vec::new();
        }
        self.walk(sequence, &relevant).spans
    }

    fn walk(&mut self, sequence: &[StationId], relevant: &[&ProblemSection]) -> Walked {
        let mut walked = Walked::default();

        let Some(first) = sequence.first() else {
            return walked;
        };
        if sequence.len() == 1 {
            if let Some(station) = self.catalog.station(first) {
                walked.full.push(station.location);
            }
            return walked;
        }

        let mut cumulative: Vec<Point> = Vec::new();
        let mut current: Option<&ProblemSection> = None;
        let mut prev = first;

        for (i, stop) in sequence[1..].iter().enumerate() {
            if current.is_none() {
                current = relevant
                    .iter()
                    .find(|section| section.first_stops.contains(prev))
                    .copied();
            }

            let mut pair_path: Vec<Point> = Vec::new();
            if let Some(station) = self.catalog.station(prev) {
                pair_path.push(station.location);
            }
            if let Some(intermediate) =
                self.resolver
                    .resolve(self.catalog, Direction::North, prev, stop)
            {
                pair_path.extend(intermediate);
            }
            if let Some(station) = self.catalog.station(stop) {
                pair_path.push(station.location);
            }

            walked.full.extend(pair_path.iter().copied());
            if current.is_some() {
                cumulative.extend(pair_path);
            }

            prev = stop;
            if let Some(section) = current {
                // Close only when no later station still matches, so a
                // recurring last-stop id (branching lines) cannot end the
                // span prematurely.
                let recurs_later = sequence[i + 2..]
                    .iter()
                    .any(|s| section.last_stops.contains(s));
                if section.last_stops.contains(stop) && !recurs_later {
                    walked.spans.push(std::mem::take(&mut cumulative));
                    current = None;
                }
            }
        }

        walked
    }
}

#[derive(Default)]
struct Walked {
    full: Vec<Point>,
    spans: Vec<Vec<Point>>,
}

/// A section is relevant to a sequence only when the sequence contains at
/// least one of its first stops and one of its last stops.
fn relevant_sections<'s>(
    sequence: &[StationId],
    sections: &'s [ProblemSection],
) -> Vec<&'s ProblemSection> {
    sections
        .iter()
        .filter(|section| {
            sequence.iter().any(|s| section.first_stops.contains(s))
                && sequence.iter().any(|s| section.last_stops.contains(s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Direction as Dir;
    use std::collections::HashMap as StdHashMap;
    use subway_feed::{StationCatalogPayload, StationPayload};

    fn station(lon: f64, lat: f64, north: &[(&str, Vec<[f64; 2]>)]) -> StationPayload {
        StationPayload {
            name: "Test".into(),
            secondary_name: None,
            longitude: lon,
            latitude: lat,
            bearing: None,
            north: north
                .iter()
                .map(|(id, shape)| (id.to_string(), shape.clone()))
                .collect(),
            south: StdHashMap::new(),
        }
    }

    fn catalog() -> StationCatalog {
        let mut raw = StationCatalogPayload::new();
        raw.insert("S01".into(), station(-74.00, 40.70, &[("S02", vec![])]));
        raw.insert(
            "S02".into(),
            station(-74.01, 40.71, &[("S03", vec![[-74.015, 40.715]])]),
        );
        raw.insert("S03".into(), station(-74.02, 40.72, &[("S04", vec![])]));
        raw.insert("S04".into(), station(-74.03, 40.73, &[]));
        StationCatalog::from_payload(&raw)
    }

    fn ids(raw: &[&str]) -> Vec<StationId> {
        raw.iter().copied().map(StationId::new).collect()
    }

    fn section(first: &[&str], last: &[&str]) -> ProblemSection {
        ProblemSection {
            direction: Dir::North,
            name: None,
            first_stops: ids(first),
            last_stops: ids(last),
            slow: false,
            delayed: true,
            headway_gap: false,
        }
    }

    #[test]
    fn test_single_station_sequence_yields_its_coordinate() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let path = builder.build_full(&ids(&["S02"]));
        assert_eq!(path, vec![Point::new(-74.01, 40.71)]);
    }

    #[test]
    fn test_full_walk_concatenates_pairs_without_gaps() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let path = builder.build_full(&ids(&["S01", "S02", "S03"]));

        // S01, [S02 via empty shape], S02, shape point, S03 — pair ends
        // meet exactly at station coordinates.
        assert_eq!(
            path,
            vec![
                Point::new(-74.00, 40.70),
                Point::new(-74.01, 40.71),
                Point::new(-74.01, 40.71),
                Point::new(-74.01, 40.71),
                Point::new(-74.015, 40.715),
                Point::new(-74.02, 40.72),
            ]
        );
    }

    #[test]
    fn test_problem_span_extraction() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        let sections = vec![section(&["S02"], &["S03"])];
        let spans = builder.build_problem_spans(&ids(&["S01", "S02", "S03", "S04"]), &sections);

        assert_eq!(spans.len(), 1);
        // The span covers exactly the S02->S03 pair.
        assert_eq!(spans[0].first(), Some(&Point::new(-74.01, 40.71)));
        assert_eq!(spans[0].last(), Some(&Point::new(-74.02, 40.72)));
    }

    #[test]
    fn test_recurring_last_stop_defers_close() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        // Last stop set matches both S02 and S04; the span must stay open
        // through S02 and close at S04.
        let sections = vec![section(&["S01"], &["S02", "S04"])];
        let spans = builder.build_problem_spans(&ids(&["S01", "S02", "S03", "S04"]), &sections);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].first(), Some(&Point::new(-74.00, 40.70)));
        assert_eq!(spans[0].last(), Some(&Point::new(-74.03, 40.73)));
    }

    #[test]
    fn test_irrelevant_sections_short_circuit() {
        let catalog = catalog();
        let mut resolver = PathResolver::new();
        let mut builder = PolylineBuilder::new(&catalog, &mut resolver);
        // The section's stops never appear in the sequence.
        let sections = vec![section(&["X01"], &["X02"])];
        let spans = builder.build_problem_spans(&ids(&["S01", "S02"]), &sections);
        assert!(spans.is_empty());
    }
}
