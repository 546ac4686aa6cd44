//! Geodesic math: great-circle distance, polygon area and perimeter, and
//! nearest-point-on-segment.
//!
//! Area and segment projection work in a local equirectangular projection
//! centered on the input, with longitude scaled by `cos(latitude)`. That is
//! accurate to well under a percent for city-scale shapes (below ~50 km²) and
//! is not meant to be geodesically exact beyond that.
//!
//! Nothing here fails: empty or degenerate input yields `0.0` or `None`.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

use crate::consts::{COINCIDENT_EPSILON_M, EARTH_RADIUS_M};

/// A geographic coordinate in decimal degrees.
///
/// Serialized as a `[latitude, longitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

impl From<[f64; 2]> for Point {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.lat, p.lon]
    }
}

/// Great-circle (haversine) distance between two points, in meters.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = wrap_lon_delta(b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Sum of consecutive distances along an open path, in meters.
#[must_use]
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Arithmetic mean of the vertices. `None` for an empty slice.
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Point> {
    let first = points.first()?;
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (lat_sum, dlon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, dlon), p| (lat + p.lat, dlon + wrap_lon_delta(p.lon - first.lon)));
    Some(Point::new(lat_sum / n, first.lon + dlon_sum / n))
}

/// Signed shoelace area in square meters. Positive for counter-clockwise
/// rings (x = east, y = north). `0.0` for fewer than three vertices.
#[must_use]
pub fn signed_polygon_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let Some(center) = centroid(ring) else {
        return 0.0;
    };
    let proj = LocalProjection::centered_on(center);

    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let (ax, ay) = proj.project(*a);
        let (bx, by) = proj.project(b);
        twice_area += ax * by - bx * ay;
    }
    twice_area / 2.0
}

/// Unsigned polygon area in square meters.
#[must_use]
pub fn polygon_area(ring: &[Point]) -> f64 {
    signed_polygon_area(ring).abs()
}

/// Ring perimeter in meters, including the closing edge back to the first vertex.
#[must_use]
pub fn polygon_perimeter(ring: &[Point]) -> f64 {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() >= 2 => path_length(ring) + distance(*last, *first),
        _ => 0.0,
    }
}

/// Closest point to `p` on the segment `seg_start..seg_end`.
///
/// Projects into a local plane centered on `p`, clamps the projection onto the
/// segment, and maps the result back to geographic coordinates. A zero-length
/// segment returns `seg_start`.
#[must_use]
pub fn nearest_point_on_segment(p: Point, seg_start: Point, seg_end: Point) -> Point {
    let proj = LocalProjection::centered_on(p);
    let (ax, ay) = proj.project(seg_start);
    let (bx, by) = proj.project(seg_end);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return seg_start;
    }
    // p sits at the origin, so the projection parameter is -a·d / |d|².
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    proj.unproject(ax + t * dx, ay + t * dy)
}

/// Number of vertices that are not within [`COINCIDENT_EPSILON_M`] of an
/// earlier vertex.
#[must_use]
pub fn distinct_vertex_count(points: &[Point]) -> usize {
    points
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            !points[..*i]
                .iter()
                .any(|q| distance(**p, *q) <= COINCIDENT_EPSILON_M)
        })
        .count()
}

/// Whether two points lie within `tolerance_m` meters of each other.
#[must_use]
pub fn within(a: Point, b: Point, tolerance_m: f64) -> bool {
    distance(a, b) <= tolerance_m
}

/// Fold a longitude difference into `[-180, 180]`.
fn wrap_lon_delta(d: f64) -> f64 {
    let w = d % 360.0;
    if w > 180.0 {
        w - 360.0
    } else if w < -180.0 {
        w + 360.0
    } else {
        w
    }
}

/// Equirectangular projection around an origin, in meters.
#[derive(Debug, Clone, Copy)]
struct LocalProjection {
    origin: Point,
    cos_lat: f64,
}

impl LocalProjection {
    fn centered_on(origin: Point) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos() }
    }

    fn project(&self, p: Point) -> (f64, f64) {
        let x = wrap_lon_delta(p.lon - self.origin.lon).to_radians() * EARTH_RADIUS_M * self.cos_lat;
        let y = (p.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    fn unproject(&self, x: f64, y: f64) -> Point {
        let lat = self.origin.lat + (y / EARTH_RADIUS_M).to_degrees();
        let lon = if self.cos_lat.abs() > f64::EPSILON {
            self.origin.lon + (x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees()
        } else {
            self.origin.lon
        };
        Point::new(lat, lon)
    }
}
