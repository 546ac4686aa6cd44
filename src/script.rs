//! Replay scripts: one host event per JSON line.
//!
//! ```text
//! {"type":"viewport","bounds":{"south":0,"west":0,"north":0.01,"east":0.01},"zoom":18}
//! {"type":"start","kind":"polygon"}
//! {"type":"click","point":[0.001,0.001]}
//! {"type":"double_click"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use draw_engine::areas::{AreaId, PartialDrawnArea};
use draw_engine::geo::Point;
use draw_engine::input::DrawKind;
use draw_engine::viewport::Bounds;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Viewport { bounds: Bounds, zoom: f64 },
    Start { kind: DrawKind },
    Click { point: Point },
    Move { point: Point },
    DoubleClick,
    Cancel,
    Undo,
    Radius { meters: f64 },
    Category { category: String },
    Delete { id: AreaId },
    Update { id: AreaId, fields: PartialDrawnArea },
}

/// A parsed event and the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub event: ScriptEvent,
}

/// Parse a whole script.
///
/// # Errors
///
/// `CliError::Script` naming the first line that is not a valid event.
pub fn parse(text: &str) -> Result<Vec<ScriptLine>, CliError> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|e| CliError::Script { line: i + 1, message: e.to_string() })?;
        out.push(ScriptLine { line: i + 1, event });
    }
    Ok(out)
}
