//! Collaborator boundary between the engine and whatever renders it.
//!
//! The engine never touches pixels or widgets. It consumes row geometry and
//! caret offsets through these traits and hands back [`FocusRequest`]s, which
//! the host fulfils once the target row exists (usually the next paint).

use serde::{Deserialize, Serialize};

/// Whether focus lands on the row itself or inside its text field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    Row,
    Edit,
}

/// Where the host should put focus after a mutation or undo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    pub task_id: String,
    pub mode: FocusMode,
    /// Char offset; only meaningful in edit mode
    pub caret: Option<usize>,
}

impl FocusRequest {
    pub fn row(task_id: impl Into<String>) -> Self {
        FocusRequest {
            task_id: task_id.into(),
            mode: FocusMode::Row,
            caret: None,
        }
    }

    pub fn edit(task_id: impl Into<String>, caret: usize) -> Self {
        FocusRequest {
            task_id: task_id.into(),
            mode: FocusMode::Edit,
            caret: Some(caret),
        }
    }
}

/// Resolves a screen point inside a rendered row to a caret offset
pub trait CaretResolver {
    fn caret_offset_from_point(&self, task_id: &str, x: f64, y: f64) -> Option<usize>;
}

/// Vertical extent of one rendered row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    pub top: f64,
    pub height: f64,
}

impl RowSpan {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Row geometry of the list as currently laid out, indexed by array position.
/// During a drag the host renders `Engine::layout_order`, which is array
/// order, so index `i` here is row `i` on screen.
pub trait RowLayout {
    fn row_span(&self, index: usize) -> Option<RowSpan>;
}

/// Every row the same height, stacked from y = 0
#[derive(Debug, Clone, Copy)]
pub struct UniformRows {
    pub row_height: f64,
    pub rows: usize,
}

impl RowLayout for UniformRows {
    fn row_span(&self, index: usize) -> Option<RowSpan> {
        (index < self.rows).then(|| RowSpan {
            top: index as f64 * self.row_height,
            height: self.row_height,
        })
    }
}
