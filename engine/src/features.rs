//! Building-outline feature index.
//!
//! DESIGN
//! ======
//! `FeatureIndex` holds one immutable `FeatureSnapshot` behind an `Arc`. A
//! refresh fetches the outlines for a viewport from a `BuildingSource` and,
//! on success, swaps in a brand-new snapshot: features outside the new
//! viewport are evicted, never merged. Readers holding the old `Arc` keep a
//! consistent view until they drop it.
//!
//! ERROR HANDLING
//! ==============
//! A failed or timed-out fetch keeps the previous snapshot installed and
//! marks the index `Stale`. Snapping keeps working against the stale data;
//! the host only sees a soft "snap unavailable" signal.
//!
//! QUERIES
//! =======
//! `nearest` converts the pixel tolerance to meters once, discards features
//! whose padded bounding box cannot reach the query point, then runs exact
//! vertex and edge distance checks on the survivors.

#[cfg(test)]
#[path = "features_test.rs"]
mod features_test;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::{COINCIDENT_EPSILON_M, MIN_POLYGON_POINTS};
use crate::geo::{self, Point};
use crate::viewport::Bounds;

/// Stable identifier of a building outline (e.g. `"way/123456"`).
pub type FeatureId = String;

/// A building outline from the external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingFeature {
    pub id: FeatureId,
    /// Vertex ring; the closing edge back to the first vertex is implicit.
    pub ring: Vec<Point>,
}

impl BuildingFeature {
    #[must_use]
    pub fn new(id: impl Into<FeatureId>, ring: Vec<Point>) -> Self {
        Self { id: id.into(), ring }
    }
}

// =============================================================================
// SOURCE
// =============================================================================

/// Errors produced while pulling outlines from a `BuildingSource`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// The request could not be sent or its body could not be read.
    #[error("building source request failed: {0}")]
    Request(String),

    /// The source answered with a non-success status.
    #[error("building source returned status {status}")]
    Status { status: u16, body: String },

    /// The response could not be decoded into features.
    #[error("building source response parse failed: {0}")]
    Parse(String),

    /// The fetch did not complete within the configured timeout.
    #[error("building source timed out after {ms}ms")]
    Timeout { ms: u64 },
}

impl SourceError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_SOURCE_REQUEST",
            Self::Status { .. } => "E_SOURCE_STATUS",
            Self::Parse(_) => "E_SOURCE_PARSE",
            Self::Timeout { .. } => "E_SOURCE_TIMEOUT",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout { .. } | Self::Status { status: 429 | 500..=599, .. })
    }
}

/// Pull-based provider of building outlines for a bounding box.
///
/// Implementations may return an empty collection and may fail; they are
/// never pushed to.
#[async_trait::async_trait]
pub trait BuildingSource: Send + Sync {
    async fn fetch(&self, bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError>;
}

/// Source with no buildings. Snapping never finds a candidate.
pub struct NoBuildings;

#[async_trait::async_trait]
impl BuildingSource for NoBuildings {
    async fn fetch(&self, _bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError> {
        Ok(Vec::new())
    }
}

/// A cloneable handle that runs one bounded fetch against the source.
///
/// Detached from the index so a fetch can run on a background task while
/// the index keeps serving queries.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn BuildingSource>,
    timeout: Duration,
}

impl Fetcher {
    /// Fetch outlines for `bounds`, mapping timeout expiry to [`SourceError::Timeout`].
    ///
    /// # Errors
    ///
    /// Returns the source's error, or `Timeout` when the deadline passes first.
    pub async fn fetch(&self, bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError> {
        match tokio::time::timeout(self.timeout, self.source.fetch(bounds)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(SourceError::Timeout { ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX) }),
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

struct IndexedFeature {
    feature: BuildingFeature,
    extent: Bounds,
}

/// One immutable generation of installed features.
pub struct FeatureSnapshot {
    bounds: Option<Bounds>,
    features: Vec<IndexedFeature>,
    generation: u64,
    fetched_at: Option<Instant>,
}

impl FeatureSnapshot {
    fn empty() -> Self {
        Self { bounds: None, features: Vec::new(), generation: 0, fetched_at: None }
    }

    fn build(bounds: Bounds, raw: Vec<BuildingFeature>, generation: u64) -> Self {
        let features = raw
            .into_iter()
            .filter_map(|f| {
                let feature = normalize(f)?;
                let extent = Bounds::from_points(&feature.ring)?;
                Some(IndexedFeature { feature, extent })
            })
            .collect();
        Self { bounds: Some(bounds), features, generation, fetched_at: Some(Instant::now()) }
    }

    /// Viewport bounds this snapshot was fetched for.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the features were installed. `None` for the initial empty snapshot.
    #[must_use]
    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> impl Iterator<Item = &BuildingFeature> {
        self.features.iter().map(|f| &f.feature)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BuildingFeature> {
        self.features().find(|f| f.id == id)
    }
}

/// Drop a repeated closing vertex and reject rings that cannot form a polygon.
fn normalize(mut feature: BuildingFeature) -> Option<BuildingFeature> {
    if let (Some(first), Some(last)) = (feature.ring.first(), feature.ring.last()) {
        if feature.ring.len() > 1 && geo::within(*first, *last, COINCIDENT_EPSILON_M) {
            feature.ring.pop();
        }
    }
    if geo::distinct_vertex_count(&feature.ring) < MIN_POLYGON_POINTS {
        debug!(id = %feature.id, "dropping degenerate building outline");
        return None;
    }
    Some(feature)
}

// =============================================================================
// INDEX
// =============================================================================

/// Health of the installed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// Nothing has been fetched yet.
    Empty,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed; the previous snapshot is still installed.
    Stale { reason: String },
}

/// What a refresh did to the index.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new snapshot with this many features was installed.
    Installed { features: usize },
    /// The installed snapshot already covers the bounds; nothing was fetched.
    Reused,
    /// The fetch failed and the previous snapshot was kept.
    Failed(SourceError),
}

/// Which part of a feature a candidate lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidateKind {
    Vertex,
    Edge,
}

/// A feature point within tolerance of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearCandidate {
    pub feature_id: FeatureId,
    pub point: Point,
    pub kind: CandidateKind,
    /// Ground distance from the query point in meters.
    pub distance_m: f64,
}

/// Owner of the current building-outline snapshot.
pub struct FeatureIndex {
    source: Arc<dyn BuildingSource>,
    fetch_timeout: Duration,
    snapshot: Arc<FeatureSnapshot>,
    status: IndexStatus,
    next_generation: u64,
}

impl FeatureIndex {
    #[must_use]
    pub fn new(source: Arc<dyn BuildingSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
            snapshot: Arc::new(FeatureSnapshot::empty()),
            status: IndexStatus::Empty,
            next_generation: 1,
        }
    }

    /// The currently installed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FeatureSnapshot> {
        Arc::clone(&self.snapshot)
    }

    #[must_use]
    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    /// `false` after a failed fetch, until the next successful one.
    #[must_use]
    pub fn snap_available(&self) -> bool {
        !matches!(self.status, IndexStatus::Stale { .. })
    }

    /// A detached fetch handle for background refreshes.
    #[must_use]
    pub fn fetcher(&self) -> Fetcher {
        Fetcher { source: Arc::clone(&self.source), timeout: self.fetch_timeout }
    }

    /// Whether `bounds` requires a fetch, i.e. the healthy snapshot does not already cover it.
    #[must_use]
    pub fn needs_fetch(&self, bounds: &Bounds) -> bool {
        let covered = self
            .snapshot
            .bounds
            .is_some_and(|b| b.contains_bounds(bounds));
        !(covered && self.status == IndexStatus::Ready)
    }

    /// Fetch the outlines for `bounds` and install them.
    pub async fn refresh(&mut self, bounds: Bounds) -> RefreshOutcome {
        if !self.needs_fetch(&bounds) {
            debug!(generation = self.snapshot.generation, "viewport covered by current snapshot");
            return RefreshOutcome::Reused;
        }
        let result = self.fetcher().fetch(bounds).await;
        self.install(bounds, result)
    }

    /// Install the result of a fetch for `bounds`.
    ///
    /// Success replaces the whole feature set; failure keeps it and marks the index stale.
    pub fn install(&mut self, bounds: Bounds, result: Result<Vec<BuildingFeature>, SourceError>) -> RefreshOutcome {
        match result {
            Ok(raw) => {
                let generation = self.next_generation;
                self.next_generation += 1;
                let snapshot = FeatureSnapshot::build(bounds, raw, generation);
                let features = snapshot.len();
                self.snapshot = Arc::new(snapshot);
                self.status = IndexStatus::Ready;
                info!(generation, features, "building snapshot installed");
                RefreshOutcome::Installed { features }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    code = e.error_code(),
                    kept_generation = self.snapshot.generation,
                    "building fetch failed; snap unavailable, keeping previous snapshot"
                );
                self.status = IndexStatus::Stale { reason: e.to_string() };
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Feature vertices and edge points within `max_pixel_tolerance` of `point`,
    /// closest first. At equal distance a vertex sorts before an edge.
    ///
    /// Each feature contributes at most its closest vertex and its closest edge point.
    #[must_use]
    pub fn nearest(&self, point: Point, max_pixel_tolerance: f64, pixels_per_meter: f64) -> Vec<NearCandidate> {
        if !(pixels_per_meter.is_finite() && pixels_per_meter > 0.0) || max_pixel_tolerance < 0.0 {
            return Vec::new();
        }
        let tolerance_m = max_pixel_tolerance / pixels_per_meter;

        let mut out = Vec::new();
        for indexed in &self.snapshot.features {
            if !indexed.extent.expanded_by_meters(tolerance_m).contains(point) {
                continue;
            }
            let ring = &indexed.feature.ring;

            let vertex = ring
                .iter()
                .map(|v| (*v, geo::distance(point, *v)))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let edge = ring
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let b = ring[(i + 1) % ring.len()];
                    let q = geo::nearest_point_on_segment(point, *a, b);
                    (q, geo::distance(point, q))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));

            for (found, kind) in [(vertex, CandidateKind::Vertex), (edge, CandidateKind::Edge)] {
                if let Some((p, d)) = found {
                    if d <= tolerance_m {
                        out.push(NearCandidate { feature_id: indexed.feature.id.clone(), point: p, kind, distance_m: d });
                    }
                }
            }
        }

        out.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m).then(a.kind.cmp(&b.kind)));
        out
    }
}
