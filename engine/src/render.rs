//! Render model handed back to the host map surface.
//!
//! The engine never draws. After each event the host asks for a
//! `RenderModel` and paints it however its map library wants: the preview
//! ring, the persisted areas, the snap indicator, and the live measurement.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::areas::DrawnArea;
use crate::draw::{DrawMode, Preview};
use crate::features::FeatureId;
use crate::geo::Point;
use crate::measure::MeasurementResult;
use crate::snap::{SnapCandidate, SnapKind};

/// Where to draw the snap marker and what it snapped to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapIndicator {
    pub point: Point,
    pub kind: SnapKind,
    pub feature_id: Option<FeatureId>,
}

impl SnapIndicator {
    /// Indicator for a snapped candidate. `None` when nothing was snapped.
    #[must_use]
    pub fn from_candidate(candidate: &SnapCandidate) -> Option<Self> {
        candidate.is_snapped().then(|| Self {
            point: candidate.point,
            kind: candidate.kind,
            feature_id: candidate.source_feature_id.clone(),
        })
    }
}

/// Everything the host needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub mode: DrawMode,
    /// Committed points of the active session.
    pub preview: Vec<Point>,
    /// Snapped pointer position, when the pointer has moved during a session.
    pub preview_point: Option<Point>,
    pub snap: Option<SnapIndicator>,
    pub measurement: Option<MeasurementResult>,
    /// Persisted areas in insertion order.
    pub areas: Vec<DrawnArea>,
    /// `false` while the building source is failing.
    pub snap_available: bool,
}

impl RenderModel {
    /// Assemble a frame from the session's committed points and the latest preview.
    ///
    /// The preview's measurement wins over the committed one, since it
    /// includes the pointer position.
    #[must_use]
    pub fn build(
        mode: DrawMode,
        committed: &[Point],
        committed_measurement: Option<&MeasurementResult>,
        preview: Option<&Preview>,
        areas: &[DrawnArea],
        snap_available: bool,
    ) -> Self {
        let measurement = preview
            .and_then(|p| p.measurement.clone())
            .or_else(|| committed_measurement.cloned());
        Self {
            mode,
            preview: committed.to_vec(),
            preview_point: preview.map(|p| p.snap.point),
            snap: preview.and_then(|p| SnapIndicator::from_candidate(&p.snap)),
            measurement,
            areas: areas.to_vec(),
            snap_available,
        }
    }

    /// Only the visible areas.
    pub fn visible_areas(&self) -> impl Iterator<Item = &DrawnArea> {
        self.areas.iter().filter(|a| a.visible)
    }
}
