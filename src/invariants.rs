//! Invariant validation for the manager state.
//!
//! Runs after every `handle_event` / `exec` in debug builds. Violations are
//! programming errors; release builds clamp defensively instead of crashing
//! the session, so this module is the place they get caught early.

use std::collections::HashMap;

use crate::layout::{MF_MAX, MF_MIN};
use crate::state::{State, NUM_WORKSPACES};

/// Which invariant was violated.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("focused client {0} does not exist")]
    FocusedClientMissing(String),

    #[error("client {0} references monitor {1} outside the directory")]
    MonitorIndexOutOfRange(String, usize),

    #[error("client {0} references workspace {1}")]
    WorkspaceIndexOutOfRange(String, usize),

    #[error("client {0} appears {1} times across sequences, expected exactly once")]
    SequenceMembership(String, usize),

    #[error("client {0} is not in the sequence of its own (monitor, workspace)")]
    SequenceMismatch(String),

    #[error("sequence references dead client {0}")]
    DanglingSequenceEntry(String),

    #[error("client {0} holds a restore geometry while neither floating nor fullscreen")]
    StrayRestoreGeometry(String),

    #[error("drag session references dead client {0}")]
    DragClientMissing(String),

    #[error("monitor {0} master ratio {1} outside [{MF_MIN}, {MF_MAX}]")]
    MasterRatioOutOfRange(usize, f64),

    #[error("monitor {0} active workspace {1} out of range")]
    ActiveWorkspaceOutOfRange(usize, usize),
}

/// Validate all invariants. Returns the first violation found.
pub fn validate(state: &State) -> Result<(), InvariantError> {
    if let Some(id) = state.focus.focused {
        if !state.clients.contains_key(&id) {
            return Err(InvariantError::FocusedClientMissing(id.to_string()));
        }
    }

    if let Some(drag) = &state.drag {
        if !state.clients.contains_key(&drag.client) {
            return Err(InvariantError::DragClientMissing(drag.client.to_string()));
        }
    }

    for (m, monitor) in state.monitors.iter().enumerate() {
        if monitor.active_workspace >= NUM_WORKSPACES {
            return Err(InvariantError::ActiveWorkspaceOutOfRange(
                m,
                monitor.active_workspace,
            ));
        }
        if !(MF_MIN..=MF_MAX).contains(&monitor.master_width) {
            return Err(InvariantError::MasterRatioOutOfRange(
                m,
                monitor.master_width,
            ));
        }
    }

    // Count sequence membership once, globally.
    let mut occurrences: HashMap<_, usize> = HashMap::new();
    for monitor in &state.monitors {
        for workspace in &monitor.workspaces {
            for id in &workspace.sequence {
                if !state.clients.contains_key(id) {
                    return Err(InvariantError::DanglingSequenceEntry(id.to_string()));
                }
                *occurrences.entry(*id).or_default() += 1;
            }
        }
    }

    // A directory with no monitors (transient during re-detection) has no
    // sequences to check against.
    if state.monitors.is_empty() {
        return Ok(());
    }

    for (id, client) in &state.clients {
        if client.monitor >= state.monitors.len() {
            return Err(InvariantError::MonitorIndexOutOfRange(
                id.to_string(),
                client.monitor,
            ));
        }
        if client.workspace >= NUM_WORKSPACES {
            return Err(InvariantError::WorkspaceIndexOutOfRange(
                id.to_string(),
                client.workspace,
            ));
        }
        match occurrences.get(id) {
            Some(1) => {}
            other => {
                return Err(InvariantError::SequenceMembership(
                    id.to_string(),
                    other.copied().unwrap_or(0),
                ));
            }
        }
        let own = state.monitors[client.monitor].workspace(client.workspace);
        if !own.contains(*id) {
            return Err(InvariantError::SequenceMismatch(id.to_string()));
        }
        if client.restore.is_some() && !client.is_floating() && !client.is_fullscreen() {
            return Err(InvariantError::StrayRestoreGeometry(id.to_string()));
        }
    }

    Ok(())
}
