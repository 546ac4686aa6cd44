use std::io::Write;

use super::*;

fn bounds() -> Bounds {
    Bounds::new(52.5, 13.3, 52.6, 13.4)
}

// ===== overpass =====

#[test]
fn query_names_bbox_in_overpass_order() {
    let q = build_query(&bounds());
    assert!(q.starts_with("[out:json]"));
    assert!(q.contains("way[\"building\"](52.5,13.3,52.6,13.4)"));
    assert!(q.ends_with("out geom;"));
}

#[test]
fn parses_ways_with_geometry() {
    let json = serde_json::json!({
        "version": 0.6,
        "elements": [
            {
                "type": "way",
                "id": 123,
                "bounds": { "minlat": 52.5, "minlon": 13.3, "maxlat": 52.51, "maxlon": 13.31 },
                "geometry": [
                    { "lat": 52.5, "lon": 13.3 },
                    { "lat": 52.5, "lon": 13.31 },
                    { "lat": 52.51, "lon": 13.31 },
                    { "lat": 52.5, "lon": 13.3 }
                ],
                "tags": { "building": "yes" }
            },
            { "type": "node", "id": 9, "lat": 52.5, "lon": 13.3 },
            { "type": "way", "id": 124 }
        ]
    })
    .to_string();
    let features = parse_overpass_response(&json).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].id, "way/123");
    assert_eq!(features[0].ring.len(), 4);
    assert_eq!(features[0].ring[1], Point::new(52.5, 13.31));
}

#[test]
fn empty_response_has_no_features() {
    assert!(parse_overpass_response("{\"elements\":[]}").unwrap().is_empty());
    assert!(parse_overpass_response("{}").unwrap().is_empty());
}

#[test]
fn malformed_response_is_parse_error() {
    let err = parse_overpass_response("<html>rate limited</html>").unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
}

#[test]
fn client_builds_and_trims_url() {
    let source = OverpassSource::new("https://example.test/api/interpreter/", Duration::from_secs(5)).unwrap();
    assert_eq!(source.url, "https://example.test/api/interpreter");
}

// ===== file =====

fn square(id: &str, lat: f64, lon: f64) -> BuildingFeature {
    BuildingFeature::new(
        id,
        vec![Point::new(lat, lon), Point::new(lat, lon + 0.001), Point::new(lat + 0.001, lon + 0.001), Point::new(lat + 0.001, lon)],
    )
}

#[tokio::test]
async fn file_source_filters_to_bounds() {
    let source = FileSource::new(vec![square("inside", 52.55, 13.35), square("edge", 52.5995, 13.35), square("far", 10.0, 10.0)]);
    let ids: Vec<String> = source.fetch(bounds()).await.unwrap().into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["inside".to_string(), "edge".to_string()]);
}

#[test]
fn file_source_loads_feature_list() {
    let path = std::env::temp_dir().join(format!("geodraw-buildings-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, r#"[{{"id":"way/1","ring":[[0,0],[0,0.001],[0.001,0]]}}]"#).unwrap();
    drop(file);

    let source = FileSource::load(&path).unwrap();
    assert_eq!(source.features.len(), 1);
    assert_eq!(source.features[0].ring[2], Point::new(0.001, 0.0));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn file_source_rejects_bad_json() {
    let path = std::env::temp_dir().join(format!("geodraw-bad-{}.json", std::process::id()));
    std::fs::write(&path, "{\"not\":\"a list\"}").unwrap();
    let err = FileSource::load(&path).err().unwrap();
    assert!(matches!(err, CliError::Buildings(_)));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_read_error() {
    let err = FileSource::load(Path::new("/nonexistent/geodraw/buildings.json")).err().unwrap();
    assert_eq!(err.error_code(), "E_READ");
}
