//! Live measurement of the in-progress point sequence.
//!
//! A pure projection: every call builds a fresh `MeasurementResult` from the
//! points it is given. Linear in the number of points.

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use std::f64::consts::PI;

use serde::Serialize;

use crate::consts::{HECTARE_THRESHOLD_M2, KILOMETER_THRESHOLD_M, SQUARE_KILOMETER_THRESHOLD_M2};
use crate::geo::{self, Point};

/// Which quantity a measurement reports as its primary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureMode {
    Distance,
    Area,
}

/// Display unit of the primary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Meters,
    Kilometers,
    SquareMeters,
    Hectares,
    SquareKilometers,
}

impl Unit {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::SquareMeters => "m²",
            Self::Hectares => "ha",
            Self::SquareKilometers => "km²",
        }
    }
}

/// Precision and unit thresholds for display values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureFormat {
    /// Digits after the decimal point.
    pub precision: usize,
    pub kilometer_threshold_m: f64,
    pub hectare_threshold_m2: f64,
    pub square_kilometer_threshold_m2: f64,
}

impl Default for MeasureFormat {
    fn default() -> Self {
        Self {
            precision: 2,
            kilometer_threshold_m: KILOMETER_THRESHOLD_M,
            hectare_threshold_m2: HECTARE_THRESHOLD_M2,
            square_kilometer_threshold_m2: SQUARE_KILOMETER_THRESHOLD_M2,
        }
    }
}

/// A derived, read-only measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    pub kind: MeasureMode,
    /// Path length in meters (distance mode).
    pub distance_m: Option<f64>,
    /// Enclosed area in square meters (area mode).
    pub area_m2: Option<f64>,
    /// Ring perimeter in meters (area mode).
    pub perimeter_m: Option<f64>,
    /// Primary value expressed in `unit`.
    pub value: f64,
    pub unit: Unit,
    pub precision: usize,
    /// `value` rounded to `precision`, followed by the unit symbol.
    pub display: String,
}

pub struct MeasurementCalculator {
    format: MeasureFormat,
}

impl MeasurementCalculator {
    #[must_use]
    pub fn new(format: MeasureFormat) -> Self {
        Self { format }
    }

    #[must_use]
    pub fn format(&self) -> MeasureFormat {
        self.format
    }

    /// Measure `points` in the given mode.
    ///
    /// Distance needs two points (more are measured as a path); area needs
    /// three. Returns `None` when there are too few.
    #[must_use]
    pub fn measure(&self, points: &[Point], mode: MeasureMode) -> Option<MeasurementResult> {
        match mode {
            MeasureMode::Distance if points.len() >= 2 => Some(self.distance_result(geo::path_length(points))),
            MeasureMode::Area if points.len() >= 3 => {
                Some(self.area_result(geo::polygon_area(points), geo::polygon_perimeter(points)))
            }
            _ => None,
        }
    }

    /// Pick the mode from the sequence length: two points measure a
    /// distance, three or more an area.
    #[must_use]
    pub fn measure_sequence(&self, points: &[Point]) -> Option<MeasurementResult> {
        let mode = if points.len() >= 3 { MeasureMode::Area } else { MeasureMode::Distance };
        self.measure(points, mode)
    }

    /// Area and circumference of a marker circle.
    #[must_use]
    pub fn measure_circle(&self, radius_m: f64) -> Option<MeasurementResult> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return None;
        }
        Some(self.area_result(PI * radius_m * radius_m, 2.0 * PI * radius_m))
    }

    fn distance_result(&self, meters: f64) -> MeasurementResult {
        let (value, unit) = if meters >= self.format.kilometer_threshold_m {
            (meters / 1_000.0, Unit::Kilometers)
        } else {
            (meters, Unit::Meters)
        };
        MeasurementResult {
            kind: MeasureMode::Distance,
            distance_m: Some(meters),
            area_m2: None,
            perimeter_m: None,
            value,
            unit,
            precision: self.format.precision,
            display: self.display(value, unit),
        }
    }

    fn area_result(&self, square_meters: f64, perimeter: f64) -> MeasurementResult {
        let (value, unit) = if square_meters >= self.format.square_kilometer_threshold_m2 {
            (square_meters / 1_000_000.0, Unit::SquareKilometers)
        } else if square_meters >= self.format.hectare_threshold_m2 {
            (square_meters / 10_000.0, Unit::Hectares)
        } else {
            (square_meters, Unit::SquareMeters)
        };
        MeasurementResult {
            kind: MeasureMode::Area,
            distance_m: None,
            area_m2: Some(square_meters),
            perimeter_m: Some(perimeter),
            value,
            unit,
            precision: self.format.precision,
            display: self.display(value, unit),
        }
    }

    fn display(&self, value: f64, unit: Unit) -> String {
        format!("{value:.prec$} {}", unit.symbol(), prec = self.format.precision)
    }
}

impl Default for MeasurementCalculator {
    fn default() -> Self {
        Self::new(MeasureFormat::default())
    }
}
