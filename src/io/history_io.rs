//! Undo history sidecar, so undo reaches across CLI invocations.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::store_io::{StoreError, atomic_write};
use crate::model::project::HISTORY_FILE;
use crate::ops::undo::{UndoAction, UndoStack};

#[derive(Serialize, Deserialize)]
struct HistoryPayload {
    version: u64,
    actions: Vec<UndoAction>,
}

pub fn save_history(outline_dir: &Path, stack: &UndoStack) -> Result<(), StoreError> {
    let payload = HistoryPayload {
        version: 1,
        actions: stack.actions().to_vec(),
    };
    let content = serde_json::to_vec(&payload)?;
    let path = outline_dir.join(HISTORY_FILE);
    atomic_write(&path, &content).map_err(|source| StoreError::Write { path, source })?;
    tracing::debug!(depth = stack.len(), "saved undo history");
    Ok(())
}

/// Returns an empty stack if the sidecar is missing or unreadable.
pub fn load_history(outline_dir: &Path, limit: usize) -> UndoStack {
    let path = outline_dir.join(HISTORY_FILE);
    let Ok(text) = fs::read_to_string(&path) else {
        return UndoStack::new(limit);
    };
    match serde_json::from_str::<HistoryPayload>(&text) {
        Ok(payload) => UndoStack::from_actions(payload.actions, limit),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "discarding unreadable undo history"
            );
            UndoStack::new(limit)
        }
    }
}
