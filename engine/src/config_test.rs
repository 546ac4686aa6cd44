#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_lookup_yields_defaults() {
    let config = EngineConfig::from_lookup(lookup_from(&[]));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn from_env_without_geodraw_vars_is_default() {
    if std::env::vars_os().any(|(k, _)| k.to_string_lossy().starts_with("GEODRAW_")) {
        return;
    }
    assert_eq!(EngineConfig::from_env(), EngineConfig::default());
}

#[test]
fn defaults_match_constants() {
    let config = EngineConfig::default();
    assert_eq!(config.snap.tolerance_px, DEFAULT_SNAP_TOLERANCE_PX);
    assert_eq!(config.snap.min_zoom, DEFAULT_SNAP_MIN_ZOOM);
    assert!(config.snap.enabled);
    assert_eq!(config.draw.close_tolerance_px, DEFAULT_CLOSE_TOLERANCE_PX);
    assert_eq!(config.draw.category, CATEGORY_REAL_ESTATE);
    assert_eq!(config.measure.precision, DEFAULT_MEASURE_PRECISION);
    assert_eq!(config.fetch_timeout, Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));
}

#[test]
fn values_are_parsed() {
    let config = EngineConfig::from_lookup(lookup_from(&[
        ("GEODRAW_SNAP_TOLERANCE_PX", "20"),
        ("GEODRAW_CLOSE_TOLERANCE_PX", " 8.5 "),
        ("GEODRAW_SNAP_MIN_ZOOM", "17"),
        ("GEODRAW_SNAP_ENABLED", "off"),
        ("GEODRAW_DEFAULT_MARKER_RADIUS_M", "250"),
        ("GEODRAW_DEFAULT_CATEGORY", "jobs"),
        ("GEODRAW_MEASURE_PRECISION", "1"),
        ("GEODRAW_FETCH_TIMEOUT_MS", "1500"),
    ]));
    assert_eq!(config.snap.tolerance_px, 20.0);
    assert_eq!(config.draw.close_tolerance_px, 8.5);
    assert_eq!(config.snap.min_zoom, 17.0);
    assert!(!config.snap.enabled);
    assert_eq!(config.draw.default_marker_radius_m, 250.0);
    assert_eq!(config.draw.category, "jobs");
    assert_eq!(config.measure.precision, 1);
    assert_eq!(config.fetch_timeout, Duration::from_millis(1500));
}

#[test]
fn unparsable_values_fall_back() {
    let config = EngineConfig::from_lookup(lookup_from(&[
        ("GEODRAW_SNAP_TOLERANCE_PX", "wide"),
        ("GEODRAW_SNAP_ENABLED", "maybe"),
        ("GEODRAW_FETCH_TIMEOUT_MS", "-1"),
        ("GEODRAW_DEFAULT_CATEGORY", "  "),
    ]));
    assert_eq!(config.snap.tolerance_px, DEFAULT_SNAP_TOLERANCE_PX);
    assert!(config.snap.enabled);
    assert_eq!(config.fetch_timeout, Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));
    assert_eq!(config.draw.category, CATEGORY_REAL_ESTATE);
}
