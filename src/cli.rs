//! Command-line flags and the wiring they select.

#[cfg(test)]
#[path = "cli_test.rs"]
mod cli_test;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use draw_engine::config::EngineConfig;
use draw_engine::features::{BuildingSource, NoBuildings};
use tracing::info;

use crate::error::CliError;
use crate::sources::{DEFAULT_OVERPASS_URL, FileSource, OverpassSource};

#[derive(Parser, Debug)]
#[command(name = "geodraw", about = "Replay host map events through the drawing engine")]
pub struct Cli {
    /// Event script, one JSON event per line. `-` reads stdin.
    pub script: PathBuf,

    /// Where building outlines for snapping come from.
    #[arg(long, value_enum, env = "GEODRAW_SOURCE", default_value = "none")]
    pub source: SourceKind,

    #[arg(long, env = "GEODRAW_OVERPASS_URL", default_value = DEFAULT_OVERPASS_URL)]
    pub overpass_url: String,

    /// JSON feature list for `--source=file`.
    #[arg(long, env = "GEODRAW_BUILDINGS_FILE")]
    pub buildings: Option<PathBuf>,

    /// Persisted areas to load before replaying.
    #[arg(long)]
    pub areas: Option<PathBuf>,

    /// Pretty-print the resulting areas.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    None,
    Overpass,
    File,
}

/// Build the building source selected by `cli`.
///
/// # Errors
///
/// `MissingBuildingsFile` for `--source=file` without `--buildings`, or any
/// error loading that file or building the HTTP client.
pub fn build_source(cli: &Cli, config: &EngineConfig) -> Result<Arc<dyn BuildingSource>, CliError> {
    let source: Arc<dyn BuildingSource> = match cli.source {
        SourceKind::None => Arc::new(NoBuildings),
        SourceKind::Overpass => {
            info!(url = %cli.overpass_url, "using overpass building source");
            Arc::new(OverpassSource::new(&cli.overpass_url, config.fetch_timeout)?)
        }
        SourceKind::File => {
            let Some(path) = cli.buildings.as_deref() else {
                return Err(CliError::MissingBuildingsFile);
            };
            info!(path = %path.display(), "using file building source");
            Arc::new(FileSource::load(path)?)
        }
    };
    Ok(source)
}

/// Read a file, or stdin for `-`.
///
/// # Errors
///
/// `CliError::Read` naming the path.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    let read_err = |source| CliError::Read { path: path.to_path_buf(), source };
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(read_err)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(read_err)
}
