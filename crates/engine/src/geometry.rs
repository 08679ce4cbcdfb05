//! Great-circle helpers for path measurement and marker placement.
//!
//! Distances are kilometers (city scale); bearings are compass degrees in
//! `(-180, 180]` with north at 0 and east at 90. Interpolation within a
//! single track segment is linear in longitude/latitude, which is accurate
//! to well under a meter at the distances involved here.

use geo::{HaversineDistance, Point};

/// Haversine distance between two points, in kilometers.
pub fn haversine_km(a: Point, b: Point) -> f64 {
    a.haversine_distance(&b) / 1000.0
}

/// Total length of a polyline, in kilometers.
pub fn line_length_km(line: &[Point]) -> f64 {
    line.windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Forward bearing from `from` to `to`, in degrees.
pub fn bearing(from: Point, to: Point) -> f64 {
    let phi1 = from.y().to_radians();
    let phi2 = to.y().to_radians();
    let delta_lambda = (to.x() - from.x()).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    y.atan2(x).to_degrees()
}

/// The point `distance_km` along the polyline, clamped to its extent:
/// a negative distance yields the first vertex, an overshoot the last.
/// Returns `None` only for an empty polyline.
pub fn point_along(line: &[Point], distance_km: f64) -> Option<Point> {
    let first = *line.first()?;
    if line.len() == 1 || distance_km <= 0.0 {
        return Some(first);
    }

    let mut travelled = 0.0;
    for pair in line.windows(2) {
        let segment = haversine_km(pair[0], pair[1]);
        if travelled + segment >= distance_km && segment > 0.0 {
            let ratio = (distance_km - travelled) / segment;
            return Some(Point::new(
                pair[0].x() + (pair[1].x() - pair[0].x()) * ratio,
                pair[0].y() + (pair[1].y() - pair[0].y()) * ratio,
            ));
        }
        travelled += segment;
    }

    line.last().copied()
}

/// Distance along the polyline to the projection of `point` onto it, in
/// kilometers. Zero for an empty or single-vertex polyline.
pub fn nearest_distance_along(line: &[Point], point: Point) -> f64 {
    let mut best = f64::INFINITY;
    let mut best_along = 0.0;
    let mut travelled = 0.0;

    for pair in line.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let abx = b.x() - a.x();
        let aby = b.y() - a.y();
        let ab2 = abx * abx + aby * aby;
        let t = if ab2 == 0.0 {
            0.0
        } else {
            (((point.x() - a.x()) * abx + (point.y() - a.y()) * aby) / ab2).clamp(0.0, 1.0)
        };
        let closest = Point::new(a.x() + t * abx, a.y() + t * aby);
        let d = haversine_km(point, closest);
        if d < best {
            best = d;
            best_along = travelled + haversine_km(a, closest);
        }
        travelled += haversine_km(a, b);
    }

    best_along
}

/// The tail of the polyline starting `distance_km` in: the interpolated
/// cut point followed by every remaining vertex.
pub fn slice_from(line: &[Point], distance_km: f64) -> Vec<Point> {
    if distance_km <= 0.0 || line.len() < 2 {
        return line.to_vec();
    }

    let mut travelled = 0.0;
    for (i, pair) in line.windows(2).enumerate() {
        let segment = haversine_km(pair[0], pair[1]);
        if travelled + segment >= distance_km && segment > 0.0 {
            let ratio = (distance_km - travelled) / segment;
            let cut = Point::new(
                pair[0].x() + (pair[1].x() - pair[0].x()) * ratio,
                pair[0].y() + (pair[1].y() - pair[0].y()) * ratio,
            );
            let mut result = vec![cut];
            result.extend_from_slice(&line[i + 1..]);
            return result;
        }
        travelled += segment;
    }

    // Past the end of the line.
    line.last().map(|p| vec![*p]).unwrap_or_default()
}
