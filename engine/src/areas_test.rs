#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn ring() -> Vec<Point> {
    vec![Point::new(52.5200, 13.4050), Point::new(52.5210, 13.4050), Point::new(52.5210, 13.4065)]
}

fn polygon_draft() -> AreaDraft {
    AreaDraft::polygon(ring(), "Office block", CATEGORY_JOBS)
}

fn marker_draft() -> AreaDraft {
    AreaDraft::marker(Point::new(10.0, 10.0), 50.0, "Flat", CATEGORY_REAL_ESTATE)
}

// =============================================================
// GeometryKind serde
// =============================================================

#[test]
fn geometry_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&GeometryKind::Marker).unwrap(), "\"marker\"");
    assert_eq!(serde_json::to_string(&GeometryKind::Polygon).unwrap(), "\"polygon\"");
}

#[test]
fn geometry_kind_rejects_unknown() {
    assert!(serde_json::from_str::<GeometryKind>("\"circle\"").is_err());
}

// =============================================================
// Persisted shape
// =============================================================

#[test]
fn polygon_record_uses_pair_list() {
    let mut repo = AreaRepository::new();
    let area = repo.create(polygon_draft().with_id("a1")).unwrap();
    let value = serde_json::to_value(&area).unwrap();
    assert_eq!(value["id"], "a1");
    assert_eq!(value["geometryKind"], "polygon");
    assert_eq!(value["coordinates"][0], json!([52.52, 13.405]));
    assert!(value.get("radius").is_none());
    assert_eq!(value["visible"], true);
    assert_eq!(value["opacity"], DEFAULT_AREA_OPACITY);
}

#[test]
fn marker_record_uses_single_pair_and_radius() {
    let mut repo = AreaRepository::new();
    let area = repo.create(marker_draft()).unwrap();
    let value = serde_json::to_value(&area).unwrap();
    assert_eq!(value["geometryKind"], "marker");
    assert_eq!(value["coordinates"], json!([10.0, 10.0]));
    assert_eq!(value["radius"], 50.0);
}

#[test]
fn record_round_trip_preserves_every_field() {
    let mut repo = AreaRepository::new();
    let draft = polygon_draft()
        .with_area_value(1_234.567_891_234)
        .with_metadata("note", json!("corner lot"))
        .with_metadata("floors", json!(4));
    let area = repo.create(draft).unwrap();

    let text = serde_json::to_string(&area).unwrap();
    let back: DrawnArea = serde_json::from_str(&text).unwrap();
    assert_eq!(back, area);
}

#[test]
fn marker_round_trip_preserves_every_field() {
    let mut repo = AreaRepository::new();
    let area = repo.create(marker_draft().with_id("m-1")).unwrap();
    let back: DrawnArea = serde_json::from_str(&serde_json::to_string(&area).unwrap()).unwrap();
    assert_eq!(back, area);
}

#[test]
fn record_missing_metadata_defaults_empty() {
    let text = r#"{"id":"x","geometryKind":"marker","coordinates":[1.0,2.0],"radius":10.0,
        "name":"n","category":"jobs","visible":false,"opacity":0.2}"#;
    let area: DrawnArea = serde_json::from_str(text).unwrap();
    assert!(area.metadata.is_empty());
    assert_eq!(area.center(), Some(Point::new(1.0, 2.0)));
    assert!(!area.visible);
}

#[test]
fn record_marker_without_radius_rejected() {
    let text = r#"{"id":"x","geometryKind":"marker","coordinates":[1.0,2.0],
        "name":"n","category":"jobs","visible":true,"opacity":0.2}"#;
    assert!(serde_json::from_str::<DrawnArea>(text).is_err());
}

#[test]
fn record_with_bad_opacity_rejected() {
    let text = r#"{"id":"x","geometryKind":"polygon","coordinates":[[0,0],[0,1],[1,1]],
        "name":"n","category":"jobs","visible":true,"opacity":1.5}"#;
    assert!(serde_json::from_str::<DrawnArea>(text).is_err());
}

// =============================================================
// create
// =============================================================

#[test]
fn create_assigns_id_when_absent() {
    let mut repo = AreaRepository::new();
    let area = repo.create(polygon_draft()).unwrap();
    assert!(!area.id.is_empty());
    assert_eq!(repo.get(&area.id), Some(&area));
}

#[test]
fn create_keeps_caller_id() {
    let mut repo = AreaRepository::new();
    let area = repo.create(polygon_draft().with_id("mine")).unwrap();
    assert_eq!(area.id, "mine");
}

#[test]
fn create_rejects_duplicate_id() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("dup")).unwrap();
    let err = repo.create(marker_draft().with_id("dup")).unwrap_err();
    assert_eq!(err, AreaError::DuplicateId { id: "dup".into() });
    assert_eq!(repo.len(), 1);
}

#[test]
fn create_rejects_short_polygon() {
    let mut repo = AreaRepository::new();
    let draft = AreaDraft::polygon(ring()[..2].to_vec(), "x", CATEGORY_JOBS);
    assert!(matches!(repo.create(draft), Err(AreaError::InvalidGeometry(_))));
    assert!(repo.is_empty());
}

#[test]
fn create_rejects_negative_radius() {
    let mut repo = AreaRepository::new();
    let draft = AreaDraft::marker(Point::new(0.0, 0.0), -1.0, "x", CATEGORY_JOBS);
    assert_eq!(repo.create(draft), Err(AreaError::InvalidRadius(-1.0)));
}

#[test]
fn list_preserves_insertion_order() {
    let mut repo = AreaRepository::new();
    for id in ["c", "a", "b"] {
        repo.create(polygon_draft().with_id(id)).unwrap();
    }
    let ids: Vec<&str> = repo.list().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);
}

#[test]
fn list_by_category_filters() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft()).unwrap();
    repo.create(marker_draft()).unwrap();
    repo.create(marker_draft()).unwrap();
    assert_eq!(repo.list_by_category(CATEGORY_REAL_ESTATE).count(), 2);
    assert_eq!(repo.list_by_category(CATEGORY_JOBS).count(), 1);
    assert_eq!(repo.list_by_category("retail").count(), 0);
}

// =============================================================
// delete
// =============================================================

#[test]
fn delete_removes_area() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a")).unwrap();
    let removed = repo.delete("a").unwrap();
    assert_eq!(removed.id, "a");
    assert!(repo.is_empty());
}

#[test]
fn delete_is_idempotent() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a")).unwrap();
    assert!(repo.delete("a").is_some());
    assert!(repo.delete("a").is_none());
    assert!(repo.delete("never").is_none());
}

// =============================================================
// update
// =============================================================

#[test]
fn update_unknown_id_is_not_found() {
    let mut repo = AreaRepository::new();
    let err = repo.update("ghost", &PartialDrawnArea::default()).unwrap_err();
    assert_eq!(err, AreaError::NotFound { id: "ghost".into() });
}

#[test]
fn update_merges_present_fields_only() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a")).unwrap();
    let partial = PartialDrawnArea { name: Some("Renamed".into()), visible: Some(false), ..Default::default() };
    let updated = repo.update("a", &partial).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert!(!updated.visible);
    assert_eq!(updated.category, CATEGORY_JOBS);
    assert_eq!(updated.opacity, DEFAULT_AREA_OPACITY);
}

#[test]
fn update_metadata_null_deletes_key() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a").with_metadata("keep", json!(1)).with_metadata("drop", json!(2)))
        .unwrap();
    let partial = PartialDrawnArea { metadata: Some(json!({"drop": null, "add": "x"})), ..Default::default() };
    let updated = repo.update("a", &partial).unwrap();
    assert_eq!(updated.metadata.get("keep"), Some(&json!(1)));
    assert!(updated.metadata.get("drop").is_none());
    assert_eq!(updated.metadata.get("add"), Some(&json!("x")));
}

#[test]
fn update_rejected_leaves_area_untouched() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a")).unwrap();
    let partial = PartialDrawnArea { name: Some("New".into()), opacity: Some(2.0), ..Default::default() };
    assert_eq!(repo.update("a", &partial).unwrap_err(), AreaError::InvalidOpacity(2.0));
    assert_eq!(repo.get("a").unwrap().name, "Office block");
}

#[test]
fn update_radius_on_polygon_rejected() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("a")).unwrap();
    let partial = PartialDrawnArea { radius: Some(10.0), ..Default::default() };
    assert!(matches!(repo.update("a", &partial), Err(AreaError::InvalidGeometry(_))));
}

#[test]
fn update_radius_recomputes_marker_area() {
    let mut repo = AreaRepository::new();
    repo.create(marker_draft().with_id("m").with_area_value(PI * 2_500.0)).unwrap();
    let partial = PartialDrawnArea { radius: Some(10.0), ..Default::default() };
    let area = repo.update("m", &partial).unwrap();
    assert_eq!(area.radius, Some(10.0));
    assert!((area.area_value.unwrap() - PI * 100.0).abs() < 1e-9);
}

#[test]
fn update_radius_keeps_explicit_area_value() {
    let mut repo = AreaRepository::new();
    repo.create(marker_draft().with_id("m")).unwrap();
    let partial = PartialDrawnArea { radius: Some(10.0), area_value: Some(7.0), ..Default::default() };
    assert_eq!(repo.update("m", &partial).unwrap().area_value, Some(7.0));
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let mut repo = AreaRepository::new();
    let mut points = ring();
    points[1] = Point::new(f64::NAN, 13.4050);
    let draft = AreaDraft::polygon(points, "Broken", CATEGORY_JOBS);
    assert!(matches!(repo.create(draft), Err(AreaError::InvalidGeometry(_))));

    let far = AreaDraft::marker(Point::new(91.0, 0.0), 50.0, "Pole", CATEGORY_JOBS);
    assert!(matches!(repo.create(far), Err(AreaError::InvalidGeometry(_))));
    assert!(repo.is_empty());
}

#[test]
fn invalid_area_value_is_rejected() {
    let mut repo = AreaRepository::new();
    let err = repo.create(polygon_draft().with_area_value(f64::NAN)).unwrap_err();
    assert!(matches!(err, AreaError::InvalidAreaValue(v) if v.is_nan()));
    assert_eq!(err.error_code(), "E_AREA_INVALID_AREA_VALUE");
    assert_eq!(repo.create(polygon_draft().with_area_value(-1.0)).unwrap_err(), AreaError::InvalidAreaValue(-1.0));

    repo.create(polygon_draft().with_id("a")).unwrap();
    let partial = PartialDrawnArea { area_value: Some(f64::INFINITY), ..Default::default() };
    assert!(repo.update("a", &partial).is_err());
    assert_eq!(repo.get("a").unwrap().area_value, None);
}

#[test]
fn set_visible_and_opacity() {
    let mut repo = AreaRepository::new();
    repo.create(marker_draft().with_id("m")).unwrap();
    assert!(!repo.set_visible("m", false).unwrap().visible);
    assert_eq!(repo.set_opacity("m", 0.9).unwrap().opacity, 0.9);
    assert_eq!(repo.set_opacity("m", -0.1).unwrap_err(), AreaError::InvalidOpacity(-0.1));
}

// =============================================================
// load_snapshot / JSON
// =============================================================

#[test]
fn json_round_trip_restores_repository() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_area_value(99.5)).unwrap();
    repo.create(marker_draft()).unwrap();
    let json = repo.to_json().unwrap();
    let restored = AreaRepository::from_json(&json).unwrap();
    assert_eq!(restored.list(), repo.list());
}

#[test]
fn load_snapshot_rejects_duplicates_and_keeps_store() {
    let mut repo = AreaRepository::new();
    repo.create(polygon_draft().with_id("keep")).unwrap();
    let mut other = AreaRepository::new();
    let a = other.create(marker_draft().with_id("x")).unwrap();
    let err = repo.load_snapshot(vec![a.clone(), a]).unwrap_err();
    assert_eq!(err, AreaError::DuplicateId { id: "x".into() });
    assert!(repo.get("keep").is_some());
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(AreaRepository::from_json("{not json"), Err(AreaError::InvalidRecord(_))));
}

// =============================================================
// AreaError
// =============================================================

#[test]
fn error_codes_are_stable() {
    assert_eq!(AreaError::NotFound { id: "a".into() }.error_code(), "E_AREA_NOT_FOUND");
    assert_eq!(AreaError::InvalidOpacity(2.0).error_code(), "E_AREA_INVALID_OPACITY");
}
