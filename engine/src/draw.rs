//! Drawing state machine.
//!
//! DESIGN
//! ======
//! `DrawingStateManager` owns the single active `DrawingSession` and moves it
//! between `Idle`, `PlacingMarker`, and `DrawingPolygon` in response to
//! pointer events. Collaborators are passed in per call (a `Snapper`, the
//! current `ZoomContext`, and the `AreaRepository` on completion paths), so
//! every transition can be driven in tests without a host map.
//!
//! POLICIES
//! ========
//! - Starting a drawing discards any unfinished session (last action wins).
//! - A marker finalizes on its first click. `set_radius` before the click
//!   sets the pending radius; after it, the radius of the just-placed marker
//!   is updated until another drawing starts.
//! - A polygon closes when a click lands within the closing tolerance of
//!   the first vertex (the closing click is not appended), or on double-click.
//! - An invalid completion attempt never destroys the session.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use std::f64::consts::PI;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::areas::{AreaDraft, AreaError, AreaId, AreaRepository, DrawnArea, PartialDrawnArea};
use crate::consts::{COINCIDENT_EPSILON_M, MIN_POLYGON_AREA_M2, MIN_POLYGON_POINTS};
use crate::geo::{self, Point};
use crate::input::DrawKind;
use crate::measure::{MeasurementCalculator, MeasurementResult};
use crate::snap::{SnapCandidate, Snapper};
use crate::viewport::ZoomContext;

// =============================================================================
// ERROR
// =============================================================================

/// Why a drawing operation was rejected. The session is always left intact.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("cannot complete: need at least {required} points, have {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    #[error("cannot complete: polygon is degenerate")]
    DegenerateGeometry,

    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("no marker to adjust")]
    NoMarker,

    #[error("no drawing in progress")]
    NotDrawing,

    #[error("point ({lat}, {lon}) is not a valid coordinate")]
    InvalidPoint { lat: f64, lon: f64 },

    #[error(transparent)]
    Area(#[from] AreaError),
}

impl DrawError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientPoints { .. } => "E_INSUFFICIENT_POINTS",
            Self::DegenerateGeometry => "E_DEGENERATE_GEOMETRY",
            Self::InvalidRadius(_) => "E_INVALID_RADIUS",
            Self::NoMarker => "E_NO_MARKER",
            Self::NotDrawing => "E_NOT_DRAWING",
            Self::InvalidPoint { .. } => "E_INVALID_POINT",
            Self::Area(e) => e.error_code(),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Mode of the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    Idle,
    PlacingMarker,
    DrawingPolygon,
}

impl From<DrawKind> for DrawMode {
    fn from(kind: DrawKind) -> Self {
        match kind {
            DrawKind::Marker => Self::PlacingMarker,
            DrawKind::Polygon => Self::DrawingPolygon,
        }
    }
}

/// The single in-progress drawing. `points` is empty whenever `mode` is `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingSession {
    mode: DrawMode,
    points: Vec<Point>,
    pending_radius: Option<f64>,
}

impl DrawingSession {
    fn start(mode: DrawMode) -> Self {
        Self { mode, points: Vec::new(), pending_radius: None }
    }

    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Committed points, in click order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Radius to use for the marker about to be placed.
    #[must_use]
    pub fn pending_radius(&self) -> Option<f64> {
        self.pending_radius
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.mode == DrawMode::Idle
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Per-call collaborators for pointer handling.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub snapper: &'a dyn Snapper,
    pub zoom: ZoomContext,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// No drawing active, or the click repeated the last vertex.
    Ignored,
    /// A vertex was appended to the polygon.
    PointAdded { snap: SnapCandidate, count: usize },
    /// The session completed and this area was stored.
    Finalized(DrawnArea),
}

/// Provisional geometry for the pointer's current position.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub snap: SnapCandidate,
    /// Committed points plus the snapped preview point.
    pub points: Vec<Point>,
    pub measurement: Option<MeasurementResult>,
}

/// Tunables for the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSettings {
    /// Screen-space distance to the first vertex that closes a polygon.
    pub close_tolerance_px: f64,
    /// Radius for markers placed without an explicit `set_radius`.
    pub default_marker_radius_m: f64,
    /// Category given to new areas.
    pub category: String,
}

// =============================================================================
// STATE MACHINE
// =============================================================================

pub struct DrawingStateManager {
    session: DrawingSession,
    settings: DrawSettings,
    calculator: MeasurementCalculator,
    measurement: Option<MeasurementResult>,
    /// Marker finalized by the last session, adjustable via `set_radius`.
    placed_marker: Option<AreaId>,
    markers_drawn: u32,
    polygons_drawn: u32,
}

impl DrawingStateManager {
    #[must_use]
    pub fn new(settings: DrawSettings, calculator: MeasurementCalculator) -> Self {
        Self {
            session: DrawingSession::default(),
            settings,
            calculator,
            measurement: None,
            placed_marker: None,
            markers_drawn: 0,
            polygons_drawn: 0,
        }
    }

    #[must_use]
    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.session.mode
    }

    /// Measurement of the committed points (or the pending marker circle).
    #[must_use]
    pub fn measurement(&self) -> Option<&MeasurementResult> {
        self.measurement.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    #[must_use]
    pub fn calculator(&self) -> &MeasurementCalculator {
        &self.calculator
    }

    /// Category for areas created from now on.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.settings.category = category.into();
    }

    /// Begin a new drawing, discarding any unfinished one.
    pub fn start_drawing(&mut self, kind: DrawKind) {
        if !self.session.is_idle() {
            debug!(
                mode = ?self.session.mode,
                points = self.session.points.len(),
                "discarding unfinished drawing"
            );
        }
        self.session = DrawingSession::start(kind.into());
        self.placed_marker = None;
        self.refresh_measurement();
        debug!(%kind, "drawing started");
    }

    /// Handle a click at `raw`.
    ///
    /// # Errors
    ///
    /// `InvalidPoint` for a non-finite or out-of-range click, or when a
    /// completion path rejects the session. The session stays as it was.
    pub fn on_pointer_click(
        &mut self,
        raw: Point,
        ctx: DrawContext<'_>,
        areas: &mut AreaRepository,
    ) -> Result<ClickOutcome, DrawError> {
        if !self.session.is_idle() && !raw.is_valid() {
            return Err(DrawError::InvalidPoint { lat: raw.lat, lon: raw.lon });
        }
        match self.session.mode {
            DrawMode::Idle => Ok(ClickOutcome::Ignored),
            DrawMode::PlacingMarker => {
                let snap = ctx.snapper.snap(raw, ctx.zoom);
                self.session.points = vec![snap.point];
                match self.finalize(areas) {
                    Ok(area) => Ok(ClickOutcome::Finalized(area)),
                    Err(e) => {
                        self.session.points.clear();
                        Err(e)
                    }
                }
            }
            DrawMode::DrawingPolygon => {
                let snap = ctx.snapper.snap(raw, ctx.zoom);
                if self.closes_ring(snap.point, ctx.zoom) {
                    debug!("click on first vertex closes polygon");
                    return self.finalize(areas).map(ClickOutcome::Finalized);
                }
                if self
                    .session
                    .points
                    .last()
                    .is_some_and(|last| geo::within(*last, snap.point, COINCIDENT_EPSILON_M))
                {
                    return Ok(ClickOutcome::Ignored);
                }
                self.session.points.push(snap.point);
                self.refresh_measurement();
                let count = self.session.points.len();
                debug!(count, snapped = ?snap.kind, "vertex added");
                Ok(ClickOutcome::PointAdded { snap, count })
            }
        }
    }

    /// Compute preview geometry for the pointer at `raw`. Never mutates the session.
    #[must_use]
    pub fn on_pointer_move(&self, raw: Point, ctx: DrawContext<'_>) -> Option<Preview> {
        if !raw.is_valid() {
            return None;
        }
        match self.session.mode {
            DrawMode::Idle => None,
            DrawMode::PlacingMarker => {
                let snap = ctx.snapper.snap(raw, ctx.zoom);
                let radius = self
                    .session
                    .pending_radius
                    .unwrap_or(self.settings.default_marker_radius_m);
                Some(Preview {
                    points: vec![snap.point],
                    measurement: self.calculator.measure_circle(radius),
                    snap,
                })
            }
            DrawMode::DrawingPolygon => {
                let snap = ctx.snapper.snap(raw, ctx.zoom);
                let mut points = Vec::with_capacity(self.session.points.len() + 1);
                points.extend_from_slice(&self.session.points);
                points.push(snap.point);
                let measurement = self.calculator.measure_sequence(&points);
                Some(Preview { snap, points, measurement })
            }
        }
    }

    /// Finish a polygon of three or more points without closing on the first vertex.
    ///
    /// Outside polygon mode this does nothing.
    ///
    /// # Errors
    ///
    /// `InsufficientPoints` or `DegenerateGeometry`; the session is kept.
    pub fn on_double_click(&mut self, areas: &mut AreaRepository) -> Result<Option<DrawnArea>, DrawError> {
        if self.session.mode != DrawMode::DrawingPolygon {
            return Ok(None);
        }
        self.finalize(areas).map(Some)
    }

    /// Drop the session without creating an area. Always succeeds.
    pub fn cancel(&mut self) {
        if !self.session.is_idle() {
            debug!(mode = ?self.session.mode, "drawing cancelled");
        }
        self.session = DrawingSession::default();
        self.measurement = None;
    }

    /// Cancel and forget the adjustable marker.
    pub fn reset(&mut self) {
        self.cancel();
        self.placed_marker = None;
    }

    /// Remove the last committed polygon vertex.
    pub fn undo_last_point(&mut self) -> Option<Point> {
        if self.session.mode != DrawMode::DrawingPolygon {
            return None;
        }
        let removed = self.session.points.pop();
        self.refresh_measurement();
        removed
    }

    /// Set the marker radius in meters.
    ///
    /// Returns the updated area when the radius was applied to an already
    /// placed marker, `None` when it was stored as the pending radius.
    ///
    /// # Errors
    ///
    /// `InvalidRadius` for non-finite or non-positive values, `NoMarker` when
    /// there is neither a marker session nor a placed marker.
    pub fn set_radius(&mut self, radius_m: f64, areas: &mut AreaRepository) -> Result<Option<DrawnArea>, DrawError> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(DrawError::InvalidRadius(radius_m));
        }
        if self.session.mode == DrawMode::PlacingMarker {
            self.session.pending_radius = Some(radius_m);
            self.refresh_measurement();
            return Ok(None);
        }
        let Some(id) = self.placed_marker.as_deref() else {
            return Err(DrawError::NoMarker);
        };
        let partial = PartialDrawnArea {
            radius: Some(radius_m),
            area_value: Some(PI * radius_m * radius_m),
            ..Default::default()
        };
        let updated = areas.update(id, &partial)?.clone();
        debug!(id = %updated.id, radius_m, "marker radius updated");
        Ok(Some(updated))
    }

    /// Validate the session and store it as a `DrawnArea`, returning to `Idle`.
    ///
    /// # Errors
    ///
    /// `NotDrawing` when idle, `InsufficientPoints` or `DegenerateGeometry` for
    /// an incomplete shape, `Area` if the repository rejects the draft. The
    /// session is unchanged on error.
    pub fn finalize(&mut self, areas: &mut AreaRepository) -> Result<DrawnArea, DrawError> {
        let draft = match self.session.mode {
            DrawMode::Idle => return Err(DrawError::NotDrawing),
            DrawMode::PlacingMarker => self.marker_draft()?,
            DrawMode::DrawingPolygon => self.polygon_draft()?,
        };
        let area = areas.create(draft)?;

        match self.session.mode {
            DrawMode::PlacingMarker => {
                self.markers_drawn += 1;
                self.placed_marker = Some(area.id.clone());
            }
            _ => {
                self.polygons_drawn += 1;
                self.placed_marker = None;
            }
        }
        info!(id = %area.id, kind = ?area.geometry_kind, points = area.coordinates.len(), "area finalized");
        self.session = DrawingSession::default();
        self.measurement = None;
        Ok(area)
    }

    fn marker_draft(&self) -> Result<AreaDraft, DrawError> {
        let Some(center) = self.session.points.first() else {
            return Err(DrawError::InsufficientPoints { required: 1, actual: 0 });
        };
        let radius = self
            .session
            .pending_radius
            .unwrap_or(self.settings.default_marker_radius_m);
        let name = format!("Marker {}", self.markers_drawn + 1);
        Ok(AreaDraft::marker(*center, radius, name, self.settings.category.clone()).with_area_value(PI * radius * radius))
    }

    fn polygon_draft(&self) -> Result<AreaDraft, DrawError> {
        let points = &self.session.points;
        if points.len() < MIN_POLYGON_POINTS {
            return Err(DrawError::InsufficientPoints { required: MIN_POLYGON_POINTS, actual: points.len() });
        }
        let area_m2 = geo::polygon_area(points);
        if geo::distinct_vertex_count(points) < MIN_POLYGON_POINTS || area_m2.is_nan() || area_m2 < MIN_POLYGON_AREA_M2 {
            return Err(DrawError::DegenerateGeometry);
        }
        let name = format!("Polygon {}", self.polygons_drawn + 1);
        Ok(AreaDraft::polygon(points.clone(), name, self.settings.category.clone())
            .with_area_value(area_m2)
            .with_metadata("perimeterMeters", json!(geo::polygon_perimeter(points))))
    }

    /// Whether `candidate` lands on the first vertex of a ring that could close.
    fn closes_ring(&self, candidate: Point, zoom: ZoomContext) -> bool {
        let points = &self.session.points;
        let Some(first) = points.first() else {
            return false;
        };
        if points.len() < MIN_POLYGON_POINTS {
            return false;
        }
        let tolerance_m = zoom.pixels_to_meters(self.settings.close_tolerance_px, first.lat);
        geo::within(*first, candidate, tolerance_m)
    }

    fn refresh_measurement(&mut self) {
        self.measurement = match self.session.mode {
            DrawMode::Idle => None,
            DrawMode::PlacingMarker => self
                .session
                .pending_radius
                .and_then(|r| self.calculator.measure_circle(r)),
            DrawMode::DrawingPolygon => self.calculator.measure_sequence(&self.session.points),
        };
    }
}
