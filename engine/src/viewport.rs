#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ZOOM, EARTH_RADIUS_M, MERCATOR_METERS_PER_PIXEL_Z0};
use crate::geo::Point;

/// Geographic bounding box in decimal degrees.
///
/// Boxes crossing the antimeridian are not supported; `west <= east` is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self { south, west, north, east }
    }

    /// Smallest box containing every point. `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self::new(first.lat, first.lon, first.lat, first.lon);
        Some(points.iter().fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lon),
            north: b.north.max(p.lat),
            east: b.east.max(p.lon),
        }))
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }

    /// Whether `other` lies entirely inside this box.
    #[must_use]
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.south >= self.south && other.north <= self.north && other.west >= self.west && other.east <= self.east
    }

    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.south <= other.north && other.south <= self.north && self.west <= other.east && other.west <= self.east
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// Grow the box by `meters` on every side.
    ///
    /// The longitude margin uses the latitude edge farthest from the equator,
    /// so the result always covers the requested radius.
    #[must_use]
    pub fn expanded_by_meters(&self, meters: f64) -> Self {
        let d_lat = (meters / EARTH_RADIUS_M).to_degrees();
        let widest = self.south.abs().max(self.north.abs()).min(89.9);
        let d_lon = d_lat / widest.to_radians().cos();
        Self {
            south: self.south - d_lat,
            west: self.west - d_lon,
            north: self.north + d_lat,
            east: self.east + d_lon,
        }
    }
}

/// Zoom level of the host map, used to convert screen pixels to ground meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomContext {
    pub zoom: f64,
}

impl ZoomContext {
    #[must_use]
    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    /// Web-Mercator ground resolution at `latitude`.
    #[must_use]
    pub fn meters_per_pixel(&self, latitude: f64) -> f64 {
        MERCATOR_METERS_PER_PIXEL_Z0 * latitude.to_radians().cos() / self.zoom.exp2()
    }

    #[must_use]
    pub fn pixels_per_meter(&self, latitude: f64) -> f64 {
        let mpp = self.meters_per_pixel(latitude);
        if mpp > 0.0 { 1.0 / mpp } else { 0.0 }
    }

    /// Convert a screen-space tolerance to ground meters at `latitude`.
    ///
    /// This is the only pixel-to-meter conversion in the engine; snapping and
    /// polygon closing both go through it.
    #[must_use]
    pub fn pixels_to_meters(&self, pixels: f64, latitude: f64) -> f64 {
        pixels * self.meters_per_pixel(latitude)
    }
}

/// What the host map is currently showing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Visible bounds, unknown until the first viewport event.
    pub bounds: Option<Bounds>,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { bounds: None, zoom: DEFAULT_ZOOM }
    }
}

impl Viewport {
    #[must_use]
    pub fn zoom_context(&self) -> ZoomContext {
        ZoomContext::new(self.zoom)
    }
}
