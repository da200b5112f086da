//! The engine façade: one task list, at most one edit session, at most one
//! drag, the undo stack and the pending focus request.
//!
//! Methods map the keyboard and pointer surface onto the `ops` modules. Each
//! performs at most one list write plus at most one undo push, and returns
//! whether anything changed.

use crate::host::{CaretResolver, FocusMode, FocusRequest, RowLayout};
use crate::model::config::ProjectConfig;
use crate::model::task::{Intent, Task};
use crate::ops::drag::{DragSession, PendingMove};
use crate::ops::edit::{self, EditSession};
use crate::ops::store::{find_task, reindex_order, sort_active_by_order, sort_for_display};
use crate::ops::task_ops;
use crate::ops::undo::{UndoAction, UndoStack};
use crate::util::unicode::char_len;

/// Wall clock in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug)]
pub struct Engine {
    tasks: Vec<Task>,
    undo: UndoStack,
    config: ProjectConfig,
    edit: Option<EditSession>,
    drag: Option<DragSession>,
    pending_move: PendingMove,
    focus: Option<FocusRequest>,
}

impl Engine {
    pub fn new(tasks: Vec<Task>, config: ProjectConfig) -> Self {
        let undo = UndoStack::new(config.undo.limit);
        Self::with_history(tasks, undo, config)
    }

    /// Open a list with an existing undo history. Active tasks are put in
    /// their stored `order` first, then reindexed, so the display order is
    /// kept and every later inverse restores an exactly equal list.
    pub fn with_history(mut tasks: Vec<Task>, undo: UndoStack, config: ProjectConfig) -> Self {
        sort_active_by_order(&mut tasks);
        reindex_order(&mut tasks);
        Engine {
            tasks,
            undo,
            config,
            edit: None,
            drag: None,
            pending_move: PendingMove::default(),
            focus: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn dragging(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Tasks in the order a host should render them
    pub fn display_order(&self) -> Vec<&Task> {
        sort_for_display(&self.tasks)
    }

    /// The rows a host lays out right now. While a drag is active this is
    /// array order, the order `RowLayout` indices refer to; otherwise it is
    /// display order.
    pub fn layout_order(&self) -> Vec<&Task> {
        if self.drag.is_some() {
            self.tasks.iter().collect()
        } else {
            self.display_order()
        }
    }

    /// Commits any open edit and hands back the list and history
    pub fn into_parts(mut self) -> (Vec<Task>, UndoStack) {
        self.commit_open();
        (self.tasks, self.undo)
    }

    /// Drain the focus request left by the last mutation. Hosts call this
    /// once the affected row has been painted.
    pub fn take_focus(&mut self) -> Option<FocusRequest> {
        self.focus.take()
    }

    fn record(&mut self, action: Option<UndoAction>) -> bool {
        match action {
            Some(action) => {
                self.undo.push(action);
                true
            }
            None => false,
        }
    }

    /// Commit the open edit, if any. Returns true if it wrote.
    fn commit_open(&mut self) -> bool {
        let Some(session) = self.edit.take() else {
            return false;
        };
        let action = edit::commit_edit(&mut self.tasks, &session);
        self.record(action)
    }

    // -----------------------------------------------------------------------
    // Edit sessions
    // -----------------------------------------------------------------------

    /// Open an edit on `id`, caret at `caret` or the end of the text. An
    /// edit open on another task is committed first.
    pub fn start_editing(&mut self, id: &str, caret: Option<usize>) -> bool {
        if self.drag.is_some() {
            return false;
        }
        if let Some(session) = self.edit.as_mut().filter(|s| s.task_id == id) {
            let caret = caret.unwrap_or(char_len(&session.live_text));
            session.caret = caret.min(char_len(&session.live_text));
            self.focus = Some(FocusRequest::edit(id, session.caret));
            return true;
        }
        self.commit_open();
        let Some(task) = find_task(&self.tasks, id) else {
            return false;
        };
        let session = EditSession::new(task, caret.unwrap_or(char_len(&task.text)));
        self.focus = Some(FocusRequest::edit(id, session.caret));
        self.edit = Some(session);
        true
    }

    /// Click inside a row's text: the host resolves the caret
    pub fn start_editing_at(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        resolver: &impl CaretResolver,
    ) -> bool {
        let caret = resolver.caret_offset_from_point(id, x, y);
        self.start_editing(id, caret)
    }

    /// Mirror the host's text field
    pub fn set_live_text(&mut self, text: &str, caret: usize) -> bool {
        match self.edit.as_mut() {
            Some(session) => {
                session.set_text(text, caret);
                true
            }
            None => false,
        }
    }

    /// After the host inserted a whitespace char. Returns the tags lifted out
    /// of the field; the host should redraw with the session's new text.
    pub fn whitespace_typed(&mut self) -> Vec<String> {
        self.edit
            .as_mut()
            .map(EditSession::scan_tags)
            .unwrap_or_default()
    }

    /// Commit and stay on the row
    pub fn commit(&mut self) -> bool {
        let id = self.edit.as_ref().map(|s| s.task_id.clone());
        let wrote = self.commit_open();
        if let Some(id) = id {
            self.focus = Some(FocusRequest::row(id));
        }
        wrote
    }

    /// Escape: commit and leave edit mode
    pub fn escape(&mut self) -> bool {
        self.commit()
    }

    /// Enter: split at the caret; the right half becomes the edit target
    pub fn enter(&mut self, now_ms: i64) -> bool {
        let Some(session) = self.edit.as_ref() else {
            return false;
        };
        let Some(outcome) = edit::split_task_at(&mut self.tasks, session, session.caret, now_ms)
        else {
            self.edit = None;
            return false;
        };
        self.focus = Some(FocusRequest::edit(&outcome.session.task_id, 0));
        self.edit = Some(outcome.session);
        self.record(Some(outcome.action))
    }

    /// Backspace with the caret at the start: merge into the previous task.
    /// Returns false (and the key should act normally) otherwise.
    pub fn backspace_at_start(&mut self) -> bool {
        let Some(session) = self.edit.as_ref().filter(|s| s.caret_at_start()) else {
            return false;
        };
        let Some(outcome) =
            edit::merge_backward(&mut self.tasks, &session.task_id, &session.raw_text())
        else {
            return false;
        };
        self.reopen_after_merge(&outcome.kept_id, outcome.caret);
        self.record(Some(outcome.action))
    }

    /// Delete with the caret at the end: absorb the next task
    pub fn delete_at_end(&mut self) -> bool {
        let Some(session) = self.edit.as_ref().filter(|s| s.caret_at_end()) else {
            return false;
        };
        let Some(outcome) =
            edit::merge_forward(&mut self.tasks, &session.task_id, &session.raw_text())
        else {
            return false;
        };
        self.reopen_after_merge(&outcome.kept_id, outcome.caret);
        self.record(Some(outcome.action))
    }

    fn reopen_after_merge(&mut self, kept_id: &str, caret: usize) {
        self.edit = find_task(&self.tasks, kept_id).map(|task| EditSession::new(task, caret));
        let caret = self.edit.as_ref().map_or(caret, |s| s.caret);
        self.focus = Some(FocusRequest::edit(kept_id, caret));
    }

    /// ArrowUp at the start of the text: commit and edit the row above
    pub fn arrow_up(&mut self) -> bool {
        self.move_edit(-1, EditSession::caret_at_start)
    }

    /// ArrowDown at the end of the text: commit and edit the row below
    pub fn arrow_down(&mut self) -> bool {
        self.move_edit(1, EditSession::caret_at_end)
    }

    fn move_edit(&mut self, step: isize, at_edge: fn(&EditSession) -> bool) -> bool {
        let Some(session) = self.edit.as_ref().filter(|s| at_edge(s)) else {
            return false;
        };
        let order = sort_for_display(&self.tasks);
        let Some(pos) = order.iter().position(|t| t.id == session.task_id) else {
            return false;
        };
        let Some(neighbor) = pos
            .checked_add_signed(step)
            .and_then(|p| order.get(p))
            .map(|t| t.id.clone())
        else {
            return false;
        };
        self.start_editing(&neighbor, None)
    }

    /// Tab on the edited row
    pub fn tab(&mut self) -> bool {
        match self.edit.as_ref().map(|s| s.task_id.clone()) {
            Some(id) => self.indent(&id),
            None => false,
        }
    }

    /// Shift+Tab on the edited row
    pub fn shift_tab(&mut self) -> bool {
        match self.edit.as_ref().map(|s| s.task_id.clone()) {
            Some(id) => self.outdent(&id),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Row commands
    // -----------------------------------------------------------------------

    /// Shared path for single-row mutations. The open edit is committed
    /// first so its snapshot and the mutation's don't overlap; editing
    /// resumes afterwards on the same task.
    fn row_command(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Vec<Task>) -> Option<UndoAction>,
    ) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let resume = self.edit.as_ref().map(|s| (s.task_id.clone(), s.caret));
        self.commit_open();
        let action = f(&mut self.tasks);
        let changed = self.record(action);
        if let Some((edit_id, caret)) = resume {
            if let Some(task) = find_task(&self.tasks, &edit_id) {
                self.edit = Some(EditSession::new(task, caret));
            }
        }
        if changed {
            self.focus = Some(match &self.edit {
                Some(s) if s.task_id == id => FocusRequest::edit(id, s.caret),
                _ => FocusRequest::row(id),
            });
        }
        changed
    }

    pub fn indent(&mut self, id: &str) -> bool {
        self.row_command(id, |list| task_ops::indent(list, id))
    }

    pub fn outdent(&mut self, id: &str) -> bool {
        self.row_command(id, |list| task_ops::outdent(list, id))
    }

    pub fn toggle_completed(&mut self, id: &str, now_ms: i64) -> bool {
        self.row_command(id, |list| task_ops::toggle_completed(list, id, now_ms))
    }

    pub fn toggle_momentum(&mut self, id: &str) -> bool {
        self.row_command(id, |list| task_ops::toggle_momentum(list, id))
    }

    pub fn set_intent(&mut self, id: &str, intent: Option<Intent>) -> bool {
        self.row_command(id, |list| task_ops::set_intent(list, id, intent))
    }

    pub fn remove_tag(&mut self, id: &str, tag: &str) -> bool {
        self.row_command(id, |list| task_ops::remove_tag(list, id, tag))
    }

    pub fn set_archived(&mut self, id: &str, archived: bool, now_ms: i64) -> bool {
        self.row_command(id, |list| task_ops::set_archived(list, id, archived, now_ms))
    }

    /// Remove a task. Focus moves to the row that took its place, or the
    /// one above when it was last.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.drag.is_some() {
            return false;
        }
        if self.edit.as_ref().is_some_and(|s| s.task_id == id) {
            self.edit = None;
        } else {
            self.commit_open();
        }
        let Some(action) = task_ops::delete_task(&mut self.tasks, id) else {
            return false;
        };
        if let UndoAction::Delete { index, .. } = &action {
            let next = self.tasks.get(*index).or_else(|| self.tasks.last());
            self.focus = next.map(|t| FocusRequest::row(&t.id));
        }
        self.record(Some(action))
    }

    /// Enter on the capture row. Not undoable.
    pub fn capture(&mut self, live_text: &str, now_ms: i64) -> Option<String> {
        self.commit_open();
        let id = edit::commit_capture(
            &mut self.tasks,
            live_text,
            self.config.capture.default_intent,
            now_ms,
        )?;
        self.focus = Some(FocusRequest::row(&id));
        Some(id)
    }

    /// Ctrl/Cmd+Z. An open edit is committed first, so the first undo
    /// reverts the typing. Focus follows the undone action.
    pub fn undo(&mut self) -> bool {
        if self.drag.is_some() {
            return false;
        }
        self.commit_open();
        let Some(focus) = self.undo.undo(&mut self.tasks) else {
            return false;
        };
        if focus.mode == FocusMode::Edit {
            self.edit = find_task(&self.tasks, &focus.task_id)
                .map(|task| EditSession::new(task, focus.caret.unwrap_or(0)));
        }
        self.focus = Some(focus);
        true
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    /// Pointer-down on a drag handle
    pub fn begin_drag(&mut self, id: &str, x: f64) -> bool {
        if self.drag.is_some() {
            return false;
        }
        self.commit_open();
        self.drag = DragSession::begin(&self.tasks, id, x);
        self.pending_move.clear();
        self.drag.is_some()
    }

    /// Pointer move. Only the latest move before the next frame is applied.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.drag.is_some() {
            self.pending_move.offer(x, y);
        }
    }

    /// Animation frame: apply the pending move, if any. `layout` must
    /// describe the rows of [`Engine::layout_order`].
    pub fn frame(&mut self, layout: &impl RowLayout) -> bool {
        let Some(session) = self.drag.as_mut() else {
            return false;
        };
        let Some((x, y)) = self.pending_move.take() else {
            return false;
        };
        let shifted = session.shift_to(&mut self.tasks, x, self.config.drag.indent_width);
        let moved = session
            .resolve_over_index(&self.tasks, y, layout)
            .is_some_and(|over| session.drag_over(&mut self.tasks, over));
        shifted || moved
    }

    /// Pointer-up
    pub fn end_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        self.pending_move.clear();
        let grabbed = session.grabbed_id.clone();
        let action = session.end(&mut self.tasks);
        if action.is_some() {
            self.focus = Some(FocusRequest::row(grabbed));
        }
        self.record(action)
    }

    /// Escape during a drag
    pub fn cancel_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        self.pending_move.clear();
        session.cancel(&mut self.tasks);
        true
    }
}
