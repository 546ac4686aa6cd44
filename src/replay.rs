//! Plays a parsed script through `EngineCore`.
//!
//! Viewport events wait for their outline fetch to settle before the next
//! event, so a replay is deterministic for a given source. Rejected
//! operations are logged and counted; they never stop the replay.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use draw_engine::engine::{Action, EngineCore};
use tracing::{debug, info, warn};

use crate::script::{ScriptEvent, ScriptLine};

/// Counters for one replay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub rejected: usize,
    pub snap_unavailable: usize,
}

impl ReplaySummary {
    fn record(&mut self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::AreaCreated(_) => self.created += 1,
                Action::AreaUpdated(_) => self.updated += 1,
                Action::AreaDeleted { .. } => self.deleted += 1,
                Action::CannotComplete(_) => self.rejected += 1,
                Action::SnapUnavailable => self.snap_unavailable += 1,
                Action::RenderNeeded => {}
            }
        }
    }
}

pub async fn run(core: &mut EngineCore, script: Vec<ScriptLine>) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for ScriptLine { line, event } in script {
        summary.events += 1;
        let actions = apply(core, line, event).await;
        debug!(line, actions = actions.len(), mode = ?core.mode(), "event applied");
        summary.record(&actions);
    }
    info!(
        events = summary.events,
        created = summary.created,
        rejected = summary.rejected,
        areas = core.areas.len(),
        "replay finished"
    );
    summary
}

async fn apply(core: &mut EngineCore, line: usize, event: ScriptEvent) -> Vec<Action> {
    match event {
        ScriptEvent::Viewport { bounds, zoom } => {
            let mut actions = core.on_viewport(draw_engine::input::ViewportEvent { bounds, zoom });
            actions.extend(core.settle_features().await);
            actions
        }
        ScriptEvent::Start { kind } => core.start_drawing(kind),
        ScriptEvent::Click { point } => core.on_click(point),
        ScriptEvent::Move { point } => core.on_move(point),
        ScriptEvent::DoubleClick => core.on_double_click(),
        ScriptEvent::Cancel => core.cancel(),
        ScriptEvent::Undo => core.undo_last_point(),
        ScriptEvent::Radius { meters } => match core.set_radius(meters) {
            Ok(actions) => actions,
            Err(e) => {
                warn!(line, error = %e, code = e.error_code(), "radius rejected");
                vec![Action::CannotComplete(e)]
            }
        },
        ScriptEvent::Category { category } => {
            core.set_category(category);
            Vec::new()
        }
        ScriptEvent::Delete { id } => core.delete_area(&id),
        ScriptEvent::Update { id, fields } => match core.update_area(&id, &fields) {
            Ok(actions) => actions,
            Err(e) => {
                warn!(line, error = %e, code = e.error_code(), "area update rejected");
                vec![Action::CannotComplete(e.into())]
            }
        },
    }
}
