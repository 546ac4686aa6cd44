//! Building-outline sources for the replay host.
//!
//! `OverpassSource` queries an Overpass API endpoint for `way["building"]`
//! in the viewport and reads each way's inline geometry. `FileSource` serves
//! a fixed feature list loaded from disk, for offline replays and tests.

#[cfg(test)]
#[path = "sources_test.rs"]
mod sources_test;

use std::path::Path;
use std::time::Duration;

use draw_engine::features::{BuildingFeature, BuildingSource, SourceError};
use draw_engine::geo::Point;
use draw_engine::viewport::Bounds;
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Server-side query timeout, in seconds.
const QUERY_TIMEOUT_SECS: u64 = 25;

// =============================================================================
// OVERPASS
// =============================================================================

pub struct OverpassSource {
    http: reqwest::Client,
    url: String,
}

impl OverpassSource {
    /// Build a client for `url`. `request_timeout` bounds the whole HTTP exchange.
    ///
    /// # Errors
    ///
    /// `SourceError::Request` if the HTTP client cannot be built.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("geodraw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;
        Ok(Self { http, url: url.trim_end_matches('/').to_string() })
    }
}

#[async_trait::async_trait]
impl BuildingSource for OverpassSource {
    async fn fetch(&self, bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError> {
        let query = build_query(&bounds);
        let response = self
            .http
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;
        if status != 200 {
            return Err(SourceError::Status { status, body: text });
        }
        let features = parse_overpass_response(&text)?;
        debug!(count = features.len(), "overpass buildings fetched");
        Ok(features)
    }
}

/// Overpass QL for every building way inside `bounds`, with inline geometry.
pub(crate) fn build_query(bounds: &Bounds) -> String {
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];way[\"building\"]({},{},{},{});out geom;",
        bounds.south, bounds.west, bounds.north, bounds.east
    )
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    geometry: Vec<OverpassNode>,
}

#[derive(Deserialize)]
struct OverpassNode {
    lat: f64,
    lon: f64,
}

/// Decode an Overpass JSON response into features with ids like `way/123`.
///
/// Elements other than ways, and ways without geometry, are skipped.
pub(crate) fn parse_overpass_response(json_text: &str) -> Result<Vec<BuildingFeature>, SourceError> {
    let root: OverpassResponse = serde_json::from_str(json_text).map_err(|e| SourceError::Parse(e.to_string()))?;
    Ok(root
        .elements
        .into_iter()
        .filter(|el| el.kind == "way" && !el.geometry.is_empty())
        .map(|el| {
            let ring = el.geometry.iter().map(|n| Point::new(n.lat, n.lon)).collect();
            BuildingFeature::new(format!("way/{}", el.id), ring)
        })
        .collect())
}

// =============================================================================
// FILE
// =============================================================================

/// Static features; a fetch returns those whose extent meets the bounds.
pub struct FileSource {
    features: Vec<BuildingFeature>,
}

impl FileSource {
    #[must_use]
    pub fn new(features: Vec<BuildingFeature>) -> Self {
        Self { features }
    }

    /// Load a JSON array of `{"id": ..., "ring": [[lat, lon], ...]}` features.
    ///
    /// # Errors
    ///
    /// `Read` if the file cannot be read, `Buildings` if it is not a feature list.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
        let features: Vec<BuildingFeature> = serde_json::from_str(&text).map_err(|e| CliError::Buildings(e.to_string()))?;
        debug!(count = features.len(), path = %path.display(), "buildings file loaded");
        Ok(Self::new(features))
    }
}

#[async_trait::async_trait]
impl BuildingSource for FileSource {
    async fn fetch(&self, bounds: Bounds) -> Result<Vec<BuildingFeature>, SourceError> {
        Ok(self
            .features
            .iter()
            .filter(|f| Bounds::from_points(&f.ring).is_some_and(|extent| extent.intersects(&bounds)))
            .cloned()
            .collect())
    }
}
