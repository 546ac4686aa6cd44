use std::path::PathBuf;

use draw_engine::areas::AreaError;
use draw_engine::features::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("--buildings is required when --source=file")]
    MissingBuildingsFile,

    #[error("invalid buildings file: {0}")]
    Buildings(String),

    #[error("building source setup failed: {0}")]
    Source(#[from] SourceError),

    #[error("invalid areas: {0}")]
    Areas(#[from] AreaError),

    #[error("JSON output failed: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_READ",
            Self::Script { .. } => "E_SCRIPT",
            Self::MissingBuildingsFile => "E_MISSING_BUILDINGS_FILE",
            Self::Buildings(_) => "E_BUILDINGS_FILE",
            Self::Source(e) => e.error_code(),
            Self::Areas(e) => e.error_code(),
            Self::Output(_) => "E_OUTPUT",
        }
    }
}
