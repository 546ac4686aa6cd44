//! Shared numeric constants for the drawing engine.

// ── Earth model ─────────────────────────────────────────────────

/// Mean Earth radius in meters (IUGG), used by every distance and projection.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Web-Mercator ground resolution at zoom 0 on the equator, meters per pixel
/// for 256-pixel tiles.
pub const MERCATOR_METERS_PER_PIXEL_Z0: f64 = 156_543.033_928_040_97;

// ── Geometry ────────────────────────────────────────────────────

/// Two vertices closer than this (meters) are treated as the same vertex.
pub const COINCIDENT_EPSILON_M: f64 = 0.01;

/// Polygons with a smaller area (square meters) are degenerate.
pub const MIN_POLYGON_AREA_M2: f64 = 0.01;

/// A polygon needs at least this many distinct vertices to be finalized.
pub const MIN_POLYGON_POINTS: usize = 3;

// ── Viewport ────────────────────────────────────────────────────

/// Zoom level assumed until the host reports a viewport.
pub const DEFAULT_ZOOM: f64 = 16.0;

// ── Measurement units ───────────────────────────────────────────

/// Distances at or above this many meters are shown in kilometers.
pub const KILOMETER_THRESHOLD_M: f64 = 1_000.0;

/// Areas at or above this many square meters are shown in hectares.
pub const HECTARE_THRESHOLD_M2: f64 = 10_000.0;

/// Areas at or above this many square meters are shown in square kilometers.
pub const SQUARE_KILOMETER_THRESHOLD_M2: f64 = 1_000_000.0;

// ── Area records ────────────────────────────────────────────────

/// Fill opacity given to newly drawn areas.
pub const DEFAULT_AREA_OPACITY: f64 = 0.5;
