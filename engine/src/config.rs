//! Engine configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

use crate::areas::CATEGORY_REAL_ESTATE;
use crate::draw::DrawSettings;
use crate::measure::MeasureFormat;
use crate::snap::SnapConfig;

pub const DEFAULT_SNAP_TOLERANCE_PX: f64 = 12.0;
pub const DEFAULT_CLOSE_TOLERANCE_PX: f64 = 12.0;
pub const DEFAULT_SNAP_MIN_ZOOM: f64 = 15.0;
pub const DEFAULT_SNAP_ENABLED: bool = true;
pub const DEFAULT_MARKER_RADIUS_M: f64 = 100.0;
pub const DEFAULT_MEASURE_PRECISION: usize = 2;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 8_000;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub draw: DrawSettings,
    pub measure: MeasureFormat,
    /// Deadline for one building-outline fetch.
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap: SnapConfig {
                enabled: DEFAULT_SNAP_ENABLED,
                min_zoom: DEFAULT_SNAP_MIN_ZOOM,
                tolerance_px: DEFAULT_SNAP_TOLERANCE_PX,
            },
            draw: DrawSettings {
                close_tolerance_px: DEFAULT_CLOSE_TOLERANCE_PX,
                default_marker_radius_m: DEFAULT_MARKER_RADIUS_M,
                category: CATEGORY_REAL_ESTATE.to_string(),
            },
            measure: MeasureFormat { precision: DEFAULT_MEASURE_PRECISION, ..MeasureFormat::default() },
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    /// Build engine config from environment variables.
    ///
    /// All optional; unset or unparsable values fall back to the defaults:
    /// - `GEODRAW_SNAP_TOLERANCE_PX`: default 12
    /// - `GEODRAW_CLOSE_TOLERANCE_PX`: default 12
    /// - `GEODRAW_SNAP_MIN_ZOOM`: default 15
    /// - `GEODRAW_SNAP_ENABLED`: default true
    /// - `GEODRAW_DEFAULT_MARKER_RADIUS_M`: default 100
    /// - `GEODRAW_DEFAULT_CATEGORY`: default `real_estate`
    /// - `GEODRAW_MEASURE_PRECISION`: default 2
    /// - `GEODRAW_FETCH_TIMEOUT_MS`: default 8000
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment, a map in tests).
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &str, default| parse_var(&lookup, key, default);
        Self {
            snap: SnapConfig {
                enabled: parse_or_bool(&lookup, "GEODRAW_SNAP_ENABLED", DEFAULT_SNAP_ENABLED),
                min_zoom: parse_or("GEODRAW_SNAP_MIN_ZOOM", DEFAULT_SNAP_MIN_ZOOM),
                tolerance_px: parse_or("GEODRAW_SNAP_TOLERANCE_PX", DEFAULT_SNAP_TOLERANCE_PX),
            },
            draw: DrawSettings {
                close_tolerance_px: parse_or("GEODRAW_CLOSE_TOLERANCE_PX", DEFAULT_CLOSE_TOLERANCE_PX),
                default_marker_radius_m: parse_or("GEODRAW_DEFAULT_MARKER_RADIUS_M", DEFAULT_MARKER_RADIUS_M),
                category: lookup("GEODRAW_DEFAULT_CATEGORY")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| CATEGORY_REAL_ESTATE.to_string()),
            },
            measure: MeasureFormat {
                precision: parse_var(&lookup, "GEODRAW_MEASURE_PRECISION", DEFAULT_MEASURE_PRECISION),
                ..MeasureFormat::default()
            },
            fetch_timeout: Duration::from_millis(parse_var(&lookup, "GEODRAW_FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or(default),
        None => default,
    }
}

fn parse_or_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
