//! Snap-to-building engine.
//!
//! Replaces a raw pointer coordinate with the closest building vertex or
//! edge point within a screen-space tolerance. A vertex within tolerance
//! always wins over an edge point, even a closer one: corners are the
//! likelier target.

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use serde::Serialize;
use tracing::debug;

use crate::features::{CandidateKind, FeatureId, FeatureIndex};
use crate::geo::Point;
use crate::viewport::ZoomContext;

/// What a snap query landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapKind {
    Vertex,
    Edge,
    None,
}

impl From<CandidateKind> for SnapKind {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Vertex => Self::Vertex,
            CandidateKind::Edge => Self::Edge,
        }
    }
}

/// Result of a snap query. Recomputed on every pointer event, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapCandidate {
    pub point: Point,
    pub kind: SnapKind,
    pub source_feature_id: Option<FeatureId>,
    /// Screen distance between the raw point and `point`.
    pub pixel_distance: f64,
}

impl SnapCandidate {
    /// The unsnapped candidate: `point` is the raw input, unchanged.
    #[must_use]
    pub fn none(raw: Point) -> Self {
        Self { point: raw, kind: SnapKind::None, source_feature_id: None, pixel_distance: 0.0 }
    }

    #[must_use]
    pub fn is_snapped(&self) -> bool {
        self.kind != SnapKind::None
    }
}

/// Snapping knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Below this zoom level snapping is skipped outright.
    pub min_zoom: f64,
    /// Default screen-space tolerance in pixels.
    pub tolerance_px: f64,
}

/// Turns raw map coordinates into snap candidates using a `FeatureIndex`.
pub struct SnapEngine {
    config: SnapConfig,
}

impl SnapEngine {
    #[must_use]
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> SnapConfig {
        self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Whether snapping runs at all for this zoom level.
    #[must_use]
    pub fn active_at(&self, zoom: ZoomContext) -> bool {
        self.config.enabled && zoom.zoom >= self.config.min_zoom
    }

    /// Snap `raw` to the best feature point within `tolerance_px`.
    ///
    /// Works against whatever snapshot `index` currently holds, stale or not.
    #[must_use]
    pub fn try_snap(&self, index: &FeatureIndex, raw: Point, tolerance_px: f64, zoom: ZoomContext) -> SnapCandidate {
        if !self.active_at(zoom) {
            return SnapCandidate::none(raw);
        }
        let pixels_per_meter = zoom.pixels_per_meter(raw.lat);
        let candidates = index.nearest(raw, tolerance_px, pixels_per_meter);

        let best = candidates
            .iter()
            .find(|c| c.kind == CandidateKind::Vertex)
            .or_else(|| candidates.iter().find(|c| c.kind == CandidateKind::Edge));

        match best {
            Some(c) => {
                debug!(feature = %c.feature_id, kind = ?c.kind, distance_m = c.distance_m, "snapped");
                SnapCandidate {
                    point: c.point,
                    kind: c.kind.into(),
                    source_feature_id: Some(c.feature_id.clone()),
                    pixel_distance: c.distance_m * pixels_per_meter,
                }
            }
            None => SnapCandidate::none(raw),
        }
    }
}

/// Snapping as seen by the drawing state machine.
pub trait Snapper {
    fn snap(&self, raw: Point, zoom: ZoomContext) -> SnapCandidate;
}

/// A `SnapEngine` paired with the index it queries, at the engine's default tolerance.
pub struct IndexedSnapper<'a> {
    pub engine: &'a SnapEngine,
    pub index: &'a FeatureIndex,
}

impl Snapper for IndexedSnapper<'_> {
    fn snap(&self, raw: Point, zoom: ZoomContext) -> SnapCandidate {
        self.engine
            .try_snap(self.index, raw, self.engine.config.tolerance_px, zoom)
    }
}

/// Never snaps.
pub struct NoSnap;

impl Snapper for NoSnap {
    fn snap(&self, raw: Point, _zoom: ZoomContext) -> SnapCandidate {
        SnapCandidate::none(raw)
    }
}
