//! Drawn-area records and the repository that owns them.
//!
//! `DrawnArea` is the finalized result of a drawing session. Its serde form
//! is the persisted record shape (`AreaRecord`): camelCase keys,
//! `[latitude, longitude]` pairs, and a single pair plus `radius` for markers.
//! Deserialization validates the record, so a stored file that round-trips
//! through `AreaRepository::from_json` is always a valid repository.
//!
//! `AreaRepository` is the only owner of the records. Other components get
//! slices or clones; mutation goes through create/update/delete.

#[cfg(test)]
#[path = "areas_test.rs"]
mod areas_test;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::consts::{DEFAULT_AREA_OPACITY, MIN_POLYGON_POINTS};
use crate::geo::Point;

/// Unique identifier for a drawn area.
pub type AreaId = String;

/// Category tag for residential and commercial property searches.
pub const CATEGORY_REAL_ESTATE: &str = "real_estate";
/// Category tag for job searches.
pub const CATEGORY_JOBS: &str = "jobs";

/// Geometry of a drawn area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    /// A single center point with a radius in meters.
    Marker,
    /// A closed ring of three or more vertices.
    Polygon,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AreaError {
    #[error("area not found: {id}")]
    NotFound { id: AreaId },

    #[error("area id already exists: {id}")]
    DuplicateId { id: AreaId },

    #[error("opacity must be within 0..=1, got {0}")]
    InvalidOpacity(f64),

    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("area value must be a finite, non-negative number of square meters, got {0}")]
    InvalidAreaValue(f64),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid area record: {0}")]
    InvalidRecord(String),
}

impl AreaError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_AREA_NOT_FOUND",
            Self::DuplicateId { .. } => "E_AREA_DUPLICATE_ID",
            Self::InvalidOpacity(_) => "E_AREA_INVALID_OPACITY",
            Self::InvalidRadius(_) => "E_AREA_INVALID_RADIUS",
            Self::InvalidAreaValue(_) => "E_AREA_INVALID_AREA_VALUE",
            Self::InvalidGeometry(_) => "E_AREA_INVALID_GEOMETRY",
            Self::InvalidRecord(_) => "E_AREA_INVALID_RECORD",
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A finalized, persisted area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "AreaRecord", try_from = "AreaRecord")]
pub struct DrawnArea {
    pub id: AreaId,
    pub geometry_kind: GeometryKind,
    /// Polygon ring, or the single marker center.
    pub coordinates: Vec<Point>,
    /// Marker radius in meters; `None` for polygons.
    pub radius: Option<f64>,
    pub name: String,
    pub category: String,
    /// Enclosed area in square meters, when known.
    pub area_value: Option<f64>,
    pub visible: bool,
    /// Fill opacity in `0..=1`.
    pub opacity: f64,
    /// Open key/value metadata.
    pub metadata: Map<String, Value>,
}

impl DrawnArea {
    /// The marker center, or `None` for polygons.
    #[must_use]
    pub fn center(&self) -> Option<Point> {
        match self.geometry_kind {
            GeometryKind::Marker => self.coordinates.first().copied(),
            GeometryKind::Polygon => None,
        }
    }

    fn validate(&self) -> Result<(), AreaError> {
        validate_opacity(self.opacity)?;
        if let Some(p) = self.coordinates.iter().find(|p| !p.is_valid()) {
            return Err(AreaError::InvalidGeometry(format!("coordinate [{}, {}] is out of range", p.lat, p.lon)));
        }
        if let Some(value) = self.area_value.filter(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(AreaError::InvalidAreaValue(value));
        }
        match self.geometry_kind {
            GeometryKind::Marker => {
                if self.coordinates.len() != 1 {
                    return Err(AreaError::InvalidGeometry(format!(
                        "marker needs exactly one coordinate, got {}",
                        self.coordinates.len()
                    )));
                }
                match self.radius {
                    Some(r) => validate_radius(r),
                    None => Err(AreaError::InvalidGeometry("marker needs a radius".into())),
                }
            }
            GeometryKind::Polygon => {
                if self.coordinates.len() < MIN_POLYGON_POINTS {
                    return Err(AreaError::InvalidGeometry(format!(
                        "polygon needs at least {MIN_POLYGON_POINTS} coordinates, got {}",
                        self.coordinates.len()
                    )));
                }
                if self.radius.is_some() {
                    return Err(AreaError::InvalidGeometry("polygon cannot carry a radius".into()));
                }
                Ok(())
            }
        }
    }
}

/// Coordinates as stored: a single pair for markers, a list of pairs for polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordCoordinates {
    Pair(Point),
    Ring(Vec<Point>),
}

/// The persisted shape of a `DrawnArea`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    pub id: AreaId,
    pub geometry_kind: GeometryKind,
    pub coordinates: RecordCoordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_value: Option<f64>,
    pub visible: bool,
    pub opacity: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl From<DrawnArea> for AreaRecord {
    fn from(area: DrawnArea) -> Self {
        let coordinates = match (area.geometry_kind, area.coordinates.as_slice()) {
            (GeometryKind::Marker, [center]) => RecordCoordinates::Pair(*center),
            _ => RecordCoordinates::Ring(area.coordinates),
        };
        Self {
            id: area.id,
            geometry_kind: area.geometry_kind,
            coordinates,
            radius: area.radius,
            name: area.name,
            category: area.category,
            area_value: area.area_value,
            visible: area.visible,
            opacity: area.opacity,
            metadata: area.metadata,
        }
    }
}

impl TryFrom<AreaRecord> for DrawnArea {
    type Error = AreaError;

    fn try_from(record: AreaRecord) -> Result<Self, Self::Error> {
        let coordinates = match record.coordinates {
            RecordCoordinates::Pair(p) => vec![p],
            RecordCoordinates::Ring(ring) => ring,
        };
        let area = Self {
            id: record.id,
            geometry_kind: record.geometry_kind,
            coordinates,
            radius: record.radius,
            name: record.name,
            category: record.category,
            area_value: record.area_value,
            visible: record.visible,
            opacity: record.opacity,
            metadata: record.metadata,
        };
        area.validate()
            .map_err(|e| AreaError::InvalidRecord(e.to_string()))?;
        Ok(area)
    }
}

/// Input to `AreaRepository::create`. The repository assigns `id` when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDraft {
    pub id: Option<AreaId>,
    pub geometry_kind: GeometryKind,
    pub coordinates: Vec<Point>,
    pub radius: Option<f64>,
    pub name: String,
    pub category: String,
    pub area_value: Option<f64>,
    pub visible: bool,
    pub opacity: f64,
    pub metadata: Map<String, Value>,
}

impl AreaDraft {
    /// A visible polygon draft with default opacity.
    #[must_use]
    pub fn polygon(ring: Vec<Point>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            geometry_kind: GeometryKind::Polygon,
            coordinates: ring,
            radius: None,
            name: name.into(),
            category: category.into(),
            area_value: None,
            visible: true,
            opacity: DEFAULT_AREA_OPACITY,
            metadata: Map::new(),
        }
    }

    /// A visible marker draft with default opacity.
    #[must_use]
    pub fn marker(center: Point, radius: f64, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            geometry_kind: GeometryKind::Marker,
            coordinates: vec![center],
            radius: Some(radius),
            name: name.into(),
            category: category.into(),
            area_value: None,
            visible: true,
            opacity: DEFAULT_AREA_OPACITY,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<AreaId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_area_value(mut self, square_meters: f64) -> Self {
        self.area_value = Some(square_meters);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Sparse update for a drawn area. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDrawnArea {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Markers only. Also resets `area_value` to the circle area unless
    /// `area_value` is given too.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_value: Option<f64>,
    /// Metadata keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

// =============================================================================
// REPOSITORY
// =============================================================================

/// Ordered in-memory store of drawn areas.
pub struct AreaRepository {
    areas: Vec<DrawnArea>,
}

impl AreaRepository {
    #[must_use]
    pub fn new() -> Self {
        Self { areas: Vec::new() }
    }

    /// Validate a draft, assign an id if needed, and append it.
    ///
    /// # Errors
    ///
    /// `DuplicateId` for a caller id already in use; `InvalidOpacity`,
    /// `InvalidRadius`, or `InvalidGeometry` for a malformed draft.
    pub fn create(&mut self, draft: AreaDraft) -> Result<DrawnArea, AreaError> {
        let id = match draft.id {
            Some(id) => {
                if self.get(&id).is_some() {
                    return Err(AreaError::DuplicateId { id });
                }
                id
            }
            None => Uuid::new_v4().to_string(),
        };
        let area = DrawnArea {
            id,
            geometry_kind: draft.geometry_kind,
            coordinates: draft.coordinates,
            radius: draft.radius,
            name: draft.name,
            category: draft.category,
            area_value: draft.area_value,
            visible: draft.visible,
            opacity: draft.opacity,
            metadata: draft.metadata,
        };
        area.validate()?;
        debug!(id = %area.id, kind = ?area.geometry_kind, "area created");
        self.areas.push(area.clone());
        Ok(area)
    }

    /// All areas in insertion order.
    #[must_use]
    pub fn list(&self) -> &[DrawnArea] {
        &self.areas
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DrawnArea> {
        self.areas.iter().find(|a| a.id == id)
    }

    /// Areas tagged with `category`, in insertion order.
    pub fn list_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a DrawnArea> + 'a {
        self.areas.iter().filter(move |a| a.category == category)
    }

    /// Remove an area. Absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<DrawnArea> {
        let index = self.areas.iter().position(|a| a.id == id)?;
        debug!(id, "area deleted");
        Some(self.areas.remove(index))
    }

    /// Merge `partial` into an existing area. Either every field applies or none does.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; validation errors leave the area untouched.
    pub fn update(&mut self, id: &str, partial: &PartialDrawnArea) -> Result<&DrawnArea, AreaError> {
        let Some(index) = self.areas.iter().position(|a| a.id == id) else {
            return Err(AreaError::NotFound { id: id.to_string() });
        };
        let mut next = self.areas[index].clone();

        if let Some(ref name) = partial.name {
            next.name.clone_from(name);
        }
        if let Some(ref category) = partial.category {
            next.category.clone_from(category);
        }
        if let Some(visible) = partial.visible {
            next.visible = visible;
        }
        if let Some(opacity) = partial.opacity {
            next.opacity = opacity;
        }
        if let Some(radius) = partial.radius {
            if next.geometry_kind != GeometryKind::Marker {
                return Err(AreaError::InvalidGeometry("only markers have a radius".into()));
            }
            next.radius = Some(radius);
            next.area_value = Some(PI * radius * radius);
        }
        if let Some(area_value) = partial.area_value {
            next.area_value = Some(area_value);
        }
        if let Some(ref metadata) = partial.metadata {
            let Some(incoming) = metadata.as_object() else {
                return Err(AreaError::InvalidRecord("metadata update must be an object".into()));
            };
            for (k, v) in incoming {
                if v.is_null() {
                    next.metadata.remove(k);
                } else {
                    next.metadata.insert(k.clone(), v.clone());
                }
            }
        }

        next.validate()?;
        self.areas[index] = next;
        Ok(&self.areas[index])
    }

    /// Show or hide an area.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<&DrawnArea, AreaError> {
        self.update(id, &PartialDrawnArea { visible: Some(visible), ..Default::default() })
    }

    /// Change an area's fill opacity.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `InvalidOpacity` outside `0..=1`.
    pub fn set_opacity(&mut self, id: &str, opacity: f64) -> Result<&DrawnArea, AreaError> {
        self.update(id, &PartialDrawnArea { opacity: Some(opacity), ..Default::default() })
    }

    /// Replace every area with `areas`, keeping their order.
    ///
    /// # Errors
    ///
    /// `DuplicateId` if two records share an id; the store is unchanged on error.
    pub fn load_snapshot(&mut self, areas: Vec<DrawnArea>) -> Result<(), AreaError> {
        for (i, area) in areas.iter().enumerate() {
            area.validate()?;
            if areas[..i].iter().any(|a| a.id == area.id) {
                return Err(AreaError::DuplicateId { id: area.id.clone() });
            }
        }
        self.areas = areas;
        Ok(())
    }

    /// Serialize every area as a JSON array of persisted records.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures (non-finite numbers in metadata, etc.).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.areas)
    }

    /// Parse a JSON array of persisted records into a repository.
    ///
    /// # Errors
    ///
    /// `InvalidRecord` for malformed JSON or records, `DuplicateId` for repeated ids.
    pub fn from_json(json: &str) -> Result<Self, AreaError> {
        let areas: Vec<DrawnArea> = serde_json::from_str(json).map_err(|e| AreaError::InvalidRecord(e.to_string()))?;
        let mut repo = Self::new();
        repo.load_snapshot(areas)?;
        Ok(repo)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl Default for AreaRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_opacity(opacity: f64) -> Result<(), AreaError> {
    if (0.0..=1.0).contains(&opacity) { Ok(()) } else { Err(AreaError::InvalidOpacity(opacity)) }
}

fn validate_radius(radius: f64) -> Result<(), AreaError> {
    if radius.is_finite() && radius > 0.0 { Ok(()) } else { Err(AreaError::InvalidRadius(radius)) }
}
