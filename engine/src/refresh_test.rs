use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::features::{BuildingSource, IndexStatus};
use crate::geo::Point;

/// Answers each known bounds after its own delay.
struct DelayedSource {
    routes: Vec<(Bounds, Duration, Result<Vec<BuildingFeature>, SourceError>)>,
}

#[async_trait::async_trait]
impl BuildingSource for DelayedSource {
    async fn fetch(&self, bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError> {
        let Some((_, delay, result)) = self.routes.iter().find(|(b, _, _)| *b == bounds) else {
            return Ok(Vec::new());
        };
        tokio::time::sleep(*delay).await;
        result.clone()
    }
}

fn tri(id: &str, lat: f64) -> BuildingFeature {
    BuildingFeature::new(id, vec![Point::new(lat, 0.0), Point::new(lat, 0.001), Point::new(lat + 0.001, 0.0)])
}

fn area_a() -> Bounds {
    Bounds::new(0.0, 0.0, 0.01, 0.01)
}

fn area_b() -> Bounds {
    Bounds::new(1.0, 1.0, 1.01, 1.01)
}

fn setup(a_delay_ms: u64, b_delay_ms: u64) -> (FeatureIndex, ViewportRefresher) {
    let source = DelayedSource {
        routes: vec![
            (area_a(), Duration::from_millis(a_delay_ms), Ok(vec![tri("a", 0.0)])),
            (area_b(), Duration::from_millis(b_delay_ms), Ok(vec![tri("b", 1.0)])),
        ],
    };
    let index = FeatureIndex::new(Arc::new(source), Duration::from_secs(5));
    let refresher = ViewportRefresher::new(&index);
    (index, refresher)
}

#[tokio::test(start_paused = true)]
async fn settle_installs_requested_bounds() {
    let (mut index, mut refresher) = setup(20, 20);
    assert!(refresher.request(area_a(), &index));
    assert!(refresher.is_pending());
    let outcome = refresher.settle(&mut index).await;
    assert_eq!(outcome, Some(RefreshOutcome::Installed { features: 1 }));
    assert!(index.snapshot().get("a").is_some());
    assert!(!refresher.is_pending());
}

#[tokio::test(start_paused = true)]
async fn newest_request_wins_over_slower_older_one() {
    let (mut index, mut refresher) = setup(500, 10);
    refresher.request(area_a(), &index);
    refresher.request(area_b(), &index);
    assert_eq!(refresher.generation(), 2);

    refresher.settle(&mut index).await;
    assert!(index.snapshot().get("b").is_some());

    // The aborted fetch for area A never lands.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(refresher.install_ready(&mut index), None);
    assert!(index.snapshot().get("a").is_none());
}

#[tokio::test(start_paused = true)]
async fn completed_but_superseded_result_is_discarded() {
    let (mut index, mut refresher) = setup(10, 50);
    refresher.request(area_a(), &index);
    // Let the fetch for A finish without installing it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!refresher.is_pending());

    refresher.request(area_b(), &index);
    let outcome = refresher.settle(&mut index).await;
    assert_eq!(outcome, Some(RefreshOutcome::Installed { features: 1 }));
    let snap = index.snapshot();
    assert_eq!(snap.generation(), 1);
    assert!(snap.get("b").is_some());
    assert!(snap.get("a").is_none());
}

#[tokio::test(start_paused = true)]
async fn install_ready_does_not_wait() {
    let (mut index, mut refresher) = setup(100, 100);
    refresher.request(area_a(), &index);
    assert_eq!(refresher.install_ready(&mut index), None);
    assert_eq!(index.status(), &IndexStatus::Empty);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(refresher.install_ready(&mut index), Some(RefreshOutcome::Installed { features: 1 }));
}

#[tokio::test]
async fn covered_bounds_skip_the_fetch() {
    let (mut index, mut refresher) = setup(0, 0);
    index.install(area_a(), Ok(vec![tri("a", 0.0)]));
    let inner = Bounds::new(0.001, 0.001, 0.002, 0.002);
    assert!(!refresher.request(inner, &index));
    assert!(!refresher.is_pending());
    assert_eq!(refresher.settle(&mut index).await, None);
}

#[tokio::test(start_paused = true)]
async fn failed_background_fetch_marks_index_stale() {
    let source = DelayedSource {
        routes: vec![(area_a(), Duration::from_millis(5), Err(SourceError::Parse("bad json".into())))],
    };
    let mut index = FeatureIndex::new(Arc::new(source), Duration::from_secs(5));
    index.install(area_b(), Ok(vec![tri("b", 1.0)]));
    let mut refresher = ViewportRefresher::new(&index);

    refresher.request(area_a(), &index);
    let outcome = refresher.settle(&mut index).await;
    assert!(matches!(outcome, Some(RefreshOutcome::Failed(SourceError::Parse(_)))));
    assert!(!index.snap_available());
    assert!(index.snapshot().get("b").is_some());
}

#[tokio::test]
async fn settle_without_request_is_none() {
    let (mut index, mut refresher) = setup(0, 0);
    assert_eq!(refresher.settle(&mut index).await, None);
}
