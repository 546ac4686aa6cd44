use std::sync::Arc;

use tracing::{debug, warn};

use crate::areas::{AreaError, AreaId, AreaRepository, DrawnArea, PartialDrawnArea};
use crate::config::EngineConfig;
use crate::draw::{ClickOutcome, DrawContext, DrawError, DrawMode, DrawingStateManager, Preview};
use crate::features::{BuildingSource, FeatureIndex, RefreshOutcome};
use crate::geo::Point;
use crate::input::{DrawKind, PointerEvent, PointerKind, ViewportEvent};
use crate::measure::MeasurementCalculator;
use crate::refresh::ViewportRefresher;
use crate::render::RenderModel;
use crate::snap::{IndexedSnapper, SnapEngine};
use crate::viewport::{Bounds, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from event handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AreaCreated(DrawnArea),
    AreaUpdated(DrawnArea),
    AreaDeleted { id: AreaId },
    /// A click or completion attempt was rejected; the session is unchanged.
    CannotComplete(DrawError),
    /// The building source is failing; drawing continues against stale outlines.
    SnapUnavailable,
    RenderNeeded,
}

/// Core engine state: the drawing pipeline plus its collaborators.
///
/// Owns no host surface, so every path can be driven from tests or the
/// replay binary.
pub struct EngineCore {
    pub areas: AreaRepository,
    pub features: FeatureIndex,
    pub snap: SnapEngine,
    pub drawing: DrawingStateManager,
    pub viewport: Viewport,
    refresher: ViewportRefresher,
    preview: Option<Preview>,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: &EngineConfig, source: Arc<dyn BuildingSource>) -> Self {
        let features = FeatureIndex::new(source, config.fetch_timeout);
        let refresher = ViewportRefresher::new(&features);
        Self {
            areas: AreaRepository::new(),
            features,
            snap: SnapEngine::new(config.snap),
            drawing: DrawingStateManager::new(config.draw.clone(), MeasurementCalculator::new(config.measure)),
            viewport: Viewport::default(),
            refresher,
            preview: None,
        }
    }

    // --- Drawing ---

    /// Begin a marker or polygon, discarding any unfinished drawing.
    pub fn start_drawing(&mut self, kind: DrawKind) -> Vec<Action> {
        self.drawing.start_drawing(kind);
        self.preview = None;
        vec![Action::RenderNeeded]
    }

    /// Route a host pointer event.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Vec<Action> {
        match event.kind {
            PointerKind::Click => self.on_click(event.point),
            PointerKind::Move => self.on_move(event.point),
            PointerKind::DoubleClick => self.on_double_click(),
            PointerKind::CancelKey => self.cancel(),
        }
    }

    pub fn on_click(&mut self, point: Point) -> Vec<Action> {
        let snapper = IndexedSnapper { engine: &self.snap, index: &self.features };
        let ctx = DrawContext { snapper: &snapper, zoom: self.viewport.zoom_context() };
        let result = self.drawing.on_pointer_click(point, ctx, &mut self.areas);
        match result {
            Ok(ClickOutcome::Ignored) => Vec::new(),
            Ok(ClickOutcome::PointAdded { .. }) => {
                self.preview = None;
                vec![Action::RenderNeeded]
            }
            Ok(ClickOutcome::Finalized(area)) => {
                self.preview = None;
                vec![Action::AreaCreated(area), Action::RenderNeeded]
            }
            Err(e) => Self::cannot_complete(e),
        }
    }

    pub fn on_move(&mut self, point: Point) -> Vec<Action> {
        let snapper = IndexedSnapper { engine: &self.snap, index: &self.features };
        let ctx = DrawContext { snapper: &snapper, zoom: self.viewport.zoom_context() };
        self.preview = self.drawing.on_pointer_move(point, ctx);
        if self.preview.is_some() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn on_double_click(&mut self) -> Vec<Action> {
        match self.drawing.on_double_click(&mut self.areas) {
            Ok(Some(area)) => {
                self.preview = None;
                vec![Action::AreaCreated(area), Action::RenderNeeded]
            }
            Ok(None) => Vec::new(),
            Err(e) => Self::cannot_complete(e),
        }
    }

    /// Drop the active drawing. A no-op when idle.
    pub fn cancel(&mut self) -> Vec<Action> {
        let was_drawing = !self.drawing.session().is_idle();
        self.drawing.cancel();
        self.preview = None;
        if was_drawing { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn undo_last_point(&mut self) -> Vec<Action> {
        match self.drawing.undo_last_point() {
            Some(_) => {
                self.preview = None;
                vec![Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Set the pending or just-placed marker radius.
    ///
    /// # Errors
    ///
    /// `InvalidRadius` or `NoMarker`; nothing changes on error.
    pub fn set_radius(&mut self, radius_m: f64) -> Result<Vec<Action>, DrawError> {
        let updated = self.drawing.set_radius(radius_m, &mut self.areas)?;
        let mut actions: Vec<Action> = updated.into_iter().map(Action::AreaUpdated).collect();
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.drawing.set_category(category);
    }

    // --- Areas ---

    /// Apply a sparse update to a stored area.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, or a validation error; the area is unchanged on error.
    pub fn update_area(&mut self, id: &str, partial: &PartialDrawnArea) -> Result<Vec<Action>, AreaError> {
        let area = self.areas.update(id, partial)?.clone();
        Ok(vec![Action::AreaUpdated(area), Action::RenderNeeded])
    }

    /// Delete an area. Unknown ids are ignored.
    pub fn delete_area(&mut self, id: &str) -> Vec<Action> {
        match self.areas.delete(id) {
            Some(area) => vec![Action::AreaDeleted { id: area.id }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Hydrate the repository from persisted records.
    ///
    /// # Errors
    ///
    /// Propagates `AreaRepository::load_snapshot` errors.
    pub fn load_areas(&mut self, areas: Vec<DrawnArea>) -> Result<Vec<Action>, AreaError> {
        self.areas.load_snapshot(areas)?;
        Ok(vec![Action::RenderNeeded])
    }

    // --- Viewport / features ---

    /// Record the new viewport and start a background outline fetch for it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn on_viewport(&mut self, event: ViewportEvent) -> Vec<Action> {
        self.viewport = Viewport { bounds: Some(event.bounds), zoom: event.zoom };
        if self.refresher.request(event.bounds, &self.features) {
            debug!(zoom = event.zoom, "feature refresh requested");
        }
        vec![Action::RenderNeeded]
    }

    /// Install a finished background fetch, if any, without waiting.
    pub fn poll_features(&mut self) -> Vec<Action> {
        let outcome = self.refresher.install_ready(&mut self.features);
        Self::refresh_actions(outcome)
    }

    /// Wait for the newest background fetch and install it.
    pub async fn settle_features(&mut self) -> Vec<Action> {
        let outcome = self.refresher.settle(&mut self.features).await;
        Self::refresh_actions(outcome)
    }

    /// Fetch outlines for `bounds` and wait for them.
    ///
    /// Goes through the refresher like a viewport change, so any background
    /// fetch still in flight is cancelled and cannot land afterwards.
    pub async fn refresh_features(&mut self, bounds: Bounds) -> Vec<Action> {
        if !self.refresher.request(bounds, &self.features) {
            return Vec::new();
        }
        self.settle_features().await
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.drawing.mode()
    }

    #[must_use]
    pub fn snap_available(&self) -> bool {
        self.features.snap_available()
    }

    #[must_use]
    pub fn area(&self, id: &str) -> Option<&DrawnArea> {
        self.areas.get(id)
    }

    /// Everything the host needs to paint the current frame.
    #[must_use]
    pub fn render_model(&self) -> RenderModel {
        let session = self.drawing.session();
        RenderModel::build(
            session.mode(),
            session.points(),
            self.drawing.measurement(),
            self.preview.as_ref(),
            self.areas.list(),
            self.snap_available(),
        )
    }

    fn cannot_complete(e: DrawError) -> Vec<Action> {
        warn!(error = %e, code = e.error_code(), "drawing cannot be completed");
        vec![Action::CannotComplete(e)]
    }

    fn refresh_actions(outcome: Option<RefreshOutcome>) -> Vec<Action> {
        match outcome {
            Some(RefreshOutcome::Installed { .. }) => vec![Action::RenderNeeded],
            Some(RefreshOutcome::Failed(_)) => vec![Action::SnapUnavailable, Action::RenderNeeded],
            Some(RefreshOutcome::Reused) | None => Vec::new(),
        }
    }
}
