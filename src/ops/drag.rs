//! Block-aware pointer reorder and indent.
//!
//! A drag grabs the block rooted at one task and moves it live: every frame
//! may shift the whole block horizontally (indent) and relocate it past the
//! row directly above or below. The list stays valid after each step, so the
//! host can re-render at any time. Ending the drag fixes up the block's depth
//! against its new neighbour and records a single undo entry; cancelling
//! puts the pre-drag list back.

use std::ops::Range;

use crate::host::RowLayout;
use crate::model::task::{MAX_INDENT, Task};
use crate::ops::store::{
    block_range, find_index, max_relative_offset, nest_under_predecessor, reindex_order,
};
use crate::ops::undo::UndoAction;

/// State of an in-progress drag
#[derive(Debug, Clone)]
pub struct DragSession {
    pub grabbed_id: String,
    /// Block members in list order; the grabbed task is first
    pub block_ids: Vec<String>,
    /// Root indent at drag start
    pub base_indent: u8,
    /// Deepest member relative to the root
    pub max_offset: u8,
    pub start_x: f64,
    start_indents: Vec<u8>,
    snapshot: Vec<Task>,
    /// Indent step currently applied
    shift: i64,
}

impl DragSession {
    /// Pointer-down on a row's handle. Archived rows can't be dragged.
    pub fn begin(list: &[Task], id: &str, x: f64) -> Option<DragSession> {
        let idx = find_index(list, id)?;
        if list[idx].archived {
            return None;
        }
        let range = block_range(list, idx);
        let block = &list[range.clone()];
        tracing::debug!(id, members = block.len(), "drag start");
        Some(DragSession {
            grabbed_id: id.to_string(),
            block_ids: block.iter().map(|t| t.id.clone()).collect(),
            base_indent: list[idx].indent,
            max_offset: max_relative_offset(list, range),
            start_x: x,
            start_indents: block.iter().map(|t| t.indent).collect(),
            snapshot: list.to_vec(),
            shift: 0,
        })
    }

    /// The list as it was when the drag began
    pub fn snapshot(&self) -> &[Task] {
        &self.snapshot
    }

    /// Where the block currently sits. None if any member has gone missing
    /// or the block is no longer contiguous.
    pub fn current_range(&self, list: &[Task]) -> Option<Range<usize>> {
        let start = find_index(list, &self.grabbed_id)?;
        let end = start + self.block_ids.len();
        let members = list.get(start..end)?;
        members
            .iter()
            .zip(&self.block_ids)
            .all(|(task, id)| task.id == *id)
            .then_some(start..end)
    }

    /// Largest shift that keeps both the root and the deepest member in
    /// `[0, MAX_INDENT]`
    pub fn clamp_shift(&self, step: i64) -> i64 {
        let lo = -i64::from(self.base_indent);
        let hi = i64::from(MAX_INDENT) - i64::from(self.base_indent) - i64::from(self.max_offset);
        step.clamp(lo, hi.max(lo))
    }

    /// Horizontal motion: `floor(delta_x / indent_width)` levels, applied to
    /// every member relative to its drag-start indent. Returns true if any
    /// indent changed.
    pub fn shift_to(&mut self, list: &mut [Task], x: f64, indent_width: f64) -> bool {
        let step = if indent_width > 0.0 {
            ((x - self.start_x) / indent_width).floor() as i64
        } else {
            0
        };
        let shift = self.clamp_shift(step);
        if shift == self.shift {
            return false;
        }
        let Some(range) = self.current_range(list) else {
            return false;
        };
        for (task, start) in list[range].iter_mut().zip(&self.start_indents) {
            task.indent = (i64::from(*start) + shift) as u8;
        }
        self.shift = shift;
        true
    }

    /// Row whose midpoint the pointer at `y` has crossed, walking outward
    /// from the block. None while the pointer is still between the
    /// neighbours' midpoints. Archived rows stop the walk.
    pub fn resolve_over_index(
        &self,
        list: &[Task],
        y: f64,
        layout: &impl RowLayout,
    ) -> Option<usize> {
        let range = self.current_range(list)?;
        let mut over = None;

        let mut i = range.start;
        while i > 0 {
            let above = i - 1;
            let Some(span) = layout.row_span(above) else {
                break;
            };
            if list[above].archived || y >= span.midpoint() {
                break;
            }
            over = Some(above);
            i = above;
        }
        if over.is_some() {
            return over;
        }

        let mut below = range.end;
        while below < list.len() {
            let Some(span) = layout.row_span(below) else {
                break;
            };
            if list[below].archived || y <= span.midpoint() {
                break;
            }
            over = Some(below);
            below += 1;
        }
        over
    }

    /// Vertical motion: move the block to the far side of row `over_index`.
    /// An index inside the block, past the end, or on an archived row is a
    /// no-op. Returns true if the list changed.
    pub fn drag_over(&self, list: &mut Vec<Task>, over_index: usize) -> bool {
        let Some(range) = self.current_range(list) else {
            return false;
        };
        if range.contains(&over_index) || over_index >= list.len() || list[over_index].archived {
            return false;
        }
        let len = range.len();
        let block: Vec<Task> = list.drain(range.clone()).collect();
        let insert_at = if over_index < range.start {
            // moving up: land before the target row
            over_index
        } else {
            // moving down: land after it (indices shifted by the drain)
            over_index + 1 - len
        };
        let tail = list.split_off(insert_at);
        list.extend(block);
        list.extend(tail);
        tracing::debug!(id = %self.grabbed_id, from = range.start, to = insert_at, "drag over");
        true
    }

    /// Pointer-up. Coerces the block so its root is at most one level below
    /// the row above it, re-nests the rows whose predecessor changed,
    /// reindexes, and returns the pre-drag list as a `Reorder` action if
    /// anything changed. A drag that moved nothing touches nothing.
    pub fn end(self, list: &mut [Task]) -> Option<UndoAction> {
        if list[..] == self.snapshot[..] {
            tracing::debug!(id = %self.grabbed_id, "drag end: unchanged");
            return None;
        }
        if let Some(range) = self.current_range(list) {
            let above = range.start.checked_sub(1).map(|i| list[i].indent);
            let limit = above.map_or(0, |indent| (indent + 1).min(MAX_INDENT));
            let base = list[range.start].indent;
            if base > limit {
                let delta = base - limit;
                for task in &mut list[range.clone()] {
                    task.indent = task.indent.saturating_sub(delta);
                }
            }
            // the row that followed the block before the drag now follows
            // whatever was above it
            let old_follower = find_index(&self.snapshot, &self.grabbed_id)
                .and_then(|start| self.snapshot.get(start + self.block_ids.len()))
                .and_then(|task| find_index(list, &task.id));
            nest_under_predecessor(list, range.end);
            if let Some(index) = old_follower {
                nest_under_predecessor(list, index);
            }
        }
        if list[..] == self.snapshot[..] {
            tracing::debug!(id = %self.grabbed_id, "drag end: back where it started");
            return None;
        }
        reindex_order(list);
        tracing::debug!(id = %self.grabbed_id, "drag end");
        Some(UndoAction::Reorder {
            tasks: self.snapshot,
            grabbed_id: self.grabbed_id,
        })
    }

    /// Escape or pointer lost: restore the pre-drag list, no undo entry
    pub fn cancel(self, list: &mut Vec<Task>) {
        tracing::debug!(id = %self.grabbed_id, "drag cancel");
        *list = self.snapshot;
    }
}

/// Coalesces pointer moves to one per animation frame. A newer move replaces
/// any that hasn't been consumed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingMove {
    latest: Option<(f64, f64)>,
}

impl PendingMove {
    pub fn offer(&mut self, x: f64, y: f64) {
        self.latest = Some((x, y));
    }

    pub fn take(&mut self) -> Option<(f64, f64)> {
        self.latest.take()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}
