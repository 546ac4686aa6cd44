use super::*;

// =============================================================
// DrawKind
// =============================================================

#[test]
fn draw_kind_parses_case_insensitively() {
    assert_eq!("polygon".parse::<DrawKind>().unwrap(), DrawKind::Polygon);
    assert_eq!(" Marker ".parse::<DrawKind>().unwrap(), DrawKind::Marker);
}

#[test]
fn draw_kind_rejects_unknown() {
    let err = "circle".parse::<DrawKind>().unwrap_err();
    assert_eq!(err, UnknownDrawKind("circle".into()));
    assert_eq!(err.to_string(), "unknown drawing kind: circle");
}

#[test]
fn draw_kind_display_matches_serde() {
    for kind in [DrawKind::Marker, DrawKind::Polygon] {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{kind}\""));
    }
}

// =============================================================
// PointerKind
// =============================================================

#[test]
fn escape_maps_to_cancel() {
    assert_eq!(PointerKind::from_key("Escape"), Some(PointerKind::CancelKey));
    assert_eq!(PointerKind::from_key("Esc"), Some(PointerKind::CancelKey));
    assert_eq!(PointerKind::from_key("Enter"), None);
}

#[test]
fn pointer_kind_serde_snake_case() {
    assert_eq!(serde_json::to_string(&PointerKind::DoubleClick).unwrap(), "\"double_click\"");
    assert_eq!(serde_json::to_string(&PointerKind::CancelKey).unwrap(), "\"cancel_key\"");
}

// =============================================================
// Events
// =============================================================

#[test]
fn pointer_event_deserializes() {
    let e: PointerEvent = serde_json::from_str(r#"{"kind":"click","point":[1.5,2.5]}"#).unwrap();
    assert_eq!(e, PointerEvent::new(PointerKind::Click, Point::new(1.5, 2.5)));
}

#[test]
fn viewport_event_deserializes() {
    let e: ViewportEvent =
        serde_json::from_str(r#"{"bounds":{"south":0,"west":1,"north":2,"east":3},"zoom":17}"#).unwrap();
    assert_eq!(e.bounds, Bounds::new(0.0, 1.0, 2.0, 3.0));
    assert!((e.zoom - 17.0).abs() < f64::EPSILON);
}
