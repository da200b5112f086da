use serde::{Deserialize, Serialize};

use crate::host::FocusRequest;
use crate::model::task::Task;
use crate::ops::store::{find_index, reindex_order};

pub const UNDO_STACK_LIMIT: usize = 500;

/// Which neighbour a merge absorbed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeDirection {
    /// Backspace at text start: the previous task absorbed the current one
    Backward,
    /// Delete at text end: the current task absorbed the next one
    Forward,
}

/// A single undoable mutation. Every task inside is a copy taken before the
/// mutation ran, so later edits to the live list cannot reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UndoAction {
    /// A task was spliced out at `index`
    Delete { task: Task, index: usize },
    /// Text, tag, intent or archive change
    Edit { task: Task },
    /// Completed or momentum flip
    Toggle { task: Task },
    /// Tab / Shift+Tab
    Indent { task: Task },
    /// `original` was split; the right half got `created_id`
    Split {
        original: Task,
        created_id: String,
        cursor: usize,
    },
    Merge {
        direction: MergeDirection,
        kept_original: Task,
        removed: Task,
        /// Caret in the surviving task right after the merge
        caret: usize,
    },
    /// Whole list before a drag
    Reorder { tasks: Vec<Task>, grabbed_id: String },
}

impl UndoAction {
    /// Short label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            UndoAction::Delete { .. } => "delete",
            UndoAction::Edit { .. } => "edit",
            UndoAction::Toggle { .. } => "toggle",
            UndoAction::Indent { .. } => "indent",
            UndoAction::Split { .. } => "split",
            UndoAction::Merge { .. } => "merge",
            UndoAction::Reorder { .. } => "reorder",
        }
    }
}

/// Apply the inverse of `action` to the current list.
///
/// Ids are re-resolved against `list`, so an action whose tasks have since
/// moved still lands on them. Parts that no longer apply (a created task
/// already gone, a removed task already back) are skipped.
pub fn apply(list: &mut Vec<Task>, action: &UndoAction) {
    match action {
        UndoAction::Delete { task, index } => {
            if find_index(list, &task.id).is_some() {
                return;
            }
            let idx = (*index).min(list.len());
            list.insert(idx, task.clone());
            reindex_order(list);
        }
        UndoAction::Edit { task } | UndoAction::Toggle { task } | UndoAction::Indent { task } => {
            replace_by_id(list, task);
        }
        UndoAction::Split {
            original,
            created_id,
            ..
        } => {
            replace_by_id(list, original);
            if *created_id != original.id {
                list.retain(|t| t.id != *created_id);
            }
            reindex_order(list);
        }
        UndoAction::Merge {
            kept_original,
            removed,
            ..
        } => {
            let kept_at = replace_by_id(list, kept_original);
            if find_index(list, &removed.id).is_none() {
                match kept_at {
                    Some(i) => list.insert(i + 1, removed.clone()),
                    None => list.push(removed.clone()),
                }
            }
            reindex_order(list);
        }
        UndoAction::Reorder { tasks, .. } => {
            *list = tasks.clone();
        }
    }
}

/// Swap the task with `snapshot.id` for the snapshot; returns its index
fn replace_by_id(list: &mut [Task], snapshot: &Task) -> Option<usize> {
    let idx = find_index(list, &snapshot.id)?;
    list[idx] = snapshot.clone();
    Some(idx)
}

/// Where focus goes after undoing `action`
pub fn focus_for(action: &UndoAction) -> FocusRequest {
    match action {
        UndoAction::Split {
            original, cursor, ..
        } => FocusRequest::edit(&original.id, *cursor),
        UndoAction::Merge {
            direction: MergeDirection::Backward,
            removed,
            ..
        } => FocusRequest::edit(&removed.id, 0),
        UndoAction::Merge {
            direction: MergeDirection::Forward,
            kept_original,
            caret,
            ..
        } => FocusRequest::edit(&kept_original.id, *caret),
        UndoAction::Delete { task, .. }
        | UndoAction::Edit { task }
        | UndoAction::Toggle { task }
        | UndoAction::Indent { task } => FocusRequest::row(&task.id),
        UndoAction::Reorder { grabbed_id, .. } => FocusRequest::row(grabbed_id),
    }
}

/// LIFO stack of undo actions. There is no redo.
#[derive(Debug, Clone)]
pub struct UndoStack {
    actions: Vec<UndoAction>,
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(UNDO_STACK_LIMIT)
    }
}

impl UndoStack {
    pub fn new(limit: usize) -> Self {
        UndoStack {
            actions: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Rebuild a stack from persisted actions, oldest first
    pub fn from_actions(actions: Vec<UndoAction>, limit: usize) -> Self {
        let mut stack = Self::new(limit);
        stack.actions = actions;
        stack.trim();
        stack
    }

    pub fn push(&mut self, action: UndoAction) {
        tracing::debug!(kind = action.label(), depth = self.actions.len() + 1, "undo push");
        self.actions.push(action);
        self.trim();
    }

    fn trim(&mut self) {
        if self.actions.len() > self.limit {
            self.actions.drain(..self.actions.len() - self.limit);
        }
    }

    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    /// Pop one action and apply its inverse to `list`. Returns the focus
    /// hint, or None when the stack was empty.
    pub fn undo(&mut self, list: &mut Vec<Task>) -> Option<FocusRequest> {
        let action = self.actions.pop()?;
        tracing::debug!(kind = action.label(), "undo");
        apply(list, &action);
        Some(focus_for(&action))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn peek_last(&self) -> Option<&UndoAction> {
        self.actions.last()
    }

    /// Oldest first
    pub fn actions(&self) -> &[UndoAction] {
        &self.actions
    }
}
