//! Input model: drawing kinds and the events the host map surface sends.
//!
//! `DrawKind` captures what the user asked to draw. `PointerEvent` and
//! `ViewportEvent` are the raw host events; they carry geographic
//! coordinates, never screen pixels, since the host map has already
//! unprojected them.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::Point;
use crate::viewport::Bounds;

/// What a drawing session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    /// A point with a radius, placed with a single click.
    Marker,
    /// A closed ring of clicked vertices.
    Polygon,
}

impl fmt::Display for DrawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker => f.write_str("marker"),
            Self::Polygon => f.write_str("polygon"),
        }
    }
}

/// Error for a drawing kind name that is neither `marker` nor `polygon`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown drawing kind: {0}")]
pub struct UnknownDrawKind(pub String);

impl FromStr for DrawKind {
    type Err = UnknownDrawKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(Self::Marker),
            "polygon" => Ok(Self::Polygon),
            other => Err(UnknownDrawKind(other.to_string())),
        }
    }
}

/// Kind of pointer event from the host map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Click,
    Move,
    DoubleClick,
    /// The cancel key (Escape) was pressed over the map.
    CancelKey,
}

impl PointerKind {
    /// Map a browser key name to a pointer kind. Only `Escape` cancels.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Escape" | "Esc" => Some(Self::CancelKey),
            _ => None,
        }
    }
}

/// A pointer event at a geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub point: Point,
}

impl PointerEvent {
    #[must_use]
    pub fn new(kind: PointerKind, point: Point) -> Self {
        Self { kind, point }
    }
}

/// The host map moved or zoomed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportEvent {
    pub bounds: Bounds,
    pub zoom: f64,
}
