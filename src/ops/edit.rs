use crate::model::task::{Intent, Task, new_task_id};
use crate::ops::store::{find_index, reindex_order};
use crate::ops::undo::{MergeDirection, UndoAction};
use crate::parse::{ParsedInput, TagScan, parse_task_input, scan_completed_tags};
use crate::util::unicode::{char_len, split_at_caret};

/// An open edit on one task. Only one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: String,
    /// Field contents, tokens not yet parsed out
    pub live_text: String,
    /// Char offset into `live_text`
    pub caret: usize,
    /// The task as it was when editing started
    pub original: Task,
    /// Tags already lifted out of `live_text` while typing
    pub scanned_tags: Vec<String>,
}

impl EditSession {
    pub fn new(task: &Task, caret: usize) -> Self {
        EditSession {
            task_id: task.id.clone(),
            live_text: task.text.clone(),
            caret: caret.min(char_len(&task.text)),
            original: task.clone(),
            scanned_tags: Vec::new(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>, caret: usize) {
        self.live_text = text.into();
        self.caret = caret.min(char_len(&self.live_text));
    }

    pub fn caret_at_start(&self) -> bool {
        self.caret == 0
    }

    pub fn caret_at_end(&self) -> bool {
        self.caret >= char_len(&self.live_text)
    }

    /// Run right after the host inserted a whitespace char: finished `#tag`
    /// tokens leave the field and are kept for the commit. Returns the tags
    /// lifted by this call.
    pub fn scan_tags(&mut self) -> Vec<String> {
        let TagScan {
            next_value,
            next_caret,
            committed,
        } = scan_completed_tags(&self.live_text, self.caret);
        self.live_text = next_value;
        self.caret = next_caret;
        for tag in &committed {
            if !self.scanned_tags.contains(tag) {
                self.scanned_tags.push(tag.clone());
            }
        }
        committed
    }

    /// Parse the live text, counting the scanned tags as typed
    pub fn parsed(&self) -> ParsedInput {
        let mut parsed = parse_task_input(&self.live_text);
        for tag in &self.scanned_tags {
            if !parsed.tags.contains(tag) {
                parsed.tags.push(tag.clone());
            }
        }
        parsed
    }

    /// The live text with the scanned tags written back as tokens, for
    /// operations that reparse a joined string
    pub fn raw_text(&self) -> String {
        let mut raw = self.live_text.clone();
        for tag in &self.scanned_tags {
            raw = join_text(&raw, &format!("#{}", tag));
        }
        raw
    }
}

/// A split's new edit target and its undo entry
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub action: UndoAction,
    /// Edit session on the new right-hand task, caret at 0
    pub session: EditSession,
}

/// A merge's surviving task and its undo entry
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub action: UndoAction,
    pub kept_id: String,
    /// Char offset in the surviving task's text
    pub caret: usize,
}

/// Write the session's live text back to its task.
///
/// Tags only accumulate: the task keeps every tag it had and gains the parsed
/// ones. Nothing is written, and None returned, when the parsed text matches
/// the original, no new tag appeared and no intent or momentum token was
/// typed, or when the task is no longer in the list.
pub fn commit_edit(list: &mut [Task], session: &EditSession) -> Option<UndoAction> {
    let idx = find_index(list, &session.task_id)?;
    let parsed = session.parsed();

    let adds_tag = parsed.tags.iter().any(|t| !session.original.has_tag(t));
    let changed = parsed.text != session.original.text
        || adds_tag
        || parsed.intent.is_some()
        || parsed.momentum;
    if !changed {
        return None;
    }

    let snapshot = list[idx].clone();
    let task = &mut list[idx];
    task.text = parsed.text;
    task.add_tags(&parsed.tags);
    if let Some(intent) = parsed.intent {
        task.intent = Some(intent);
    }
    if parsed.momentum {
        task.momentum = true;
    }
    if *task == snapshot {
        return None;
    }
    tracing::debug!(id = %snapshot.id, "commit edit");
    Some(UndoAction::Edit { task: snapshot })
}

/// Split the session's task at `cursor` (a char offset into the live text).
///
/// The left half keeps the id and every tag found anywhere in the live text.
/// The right half becomes a new task right after it, with the same indent,
/// no tags, and only the intent/momentum typed after the cursor.
pub fn split_task_at(
    list: &mut Vec<Task>,
    session: &EditSession,
    cursor: usize,
    now_ms: i64,
) -> Option<SplitOutcome> {
    let idx = find_index(list, &session.task_id)?;
    let cursor = cursor.min(char_len(&session.live_text));
    let (before, after) = split_at_caret(&session.live_text, cursor);
    let left = parse_task_input(before);
    let right = parse_task_input(after);
    let whole = session.parsed();

    let snapshot = list[idx].clone();
    let task = &mut list[idx];
    task.text = left.text;
    task.add_tags(&session.original.tags);
    task.add_tags(&whole.tags);
    if let Some(intent) = left.intent {
        task.intent = Some(intent);
    }
    if left.momentum {
        task.momentum = true;
    }

    let created_id = new_task_id();
    let mut created = Task::new(created_id.clone(), right.text, now_ms);
    created.indent = snapshot.indent;
    created.intent = right.intent;
    created.momentum = right.momentum;
    list.insert(idx + 1, created);
    reindex_order(list);

    tracing::debug!(id = %snapshot.id, created = %created_id, cursor, "split");
    let session = EditSession::new(&list[idx + 1], 0);
    Some(SplitOutcome {
        action: UndoAction::Split {
            original: snapshot,
            created_id,
            cursor,
        },
        session,
    })
}

/// Backspace at the start of `current_id`: the previous task absorbs it.
///
/// No-op on the first row, or when either task is archived.
pub fn merge_backward(
    list: &mut Vec<Task>,
    current_id: &str,
    live_text: &str,
) -> Option<MergeOutcome> {
    let idx = find_index(list, current_id)?;
    let prev_idx = idx.checked_sub(1)?;
    if list[prev_idx].archived || list[idx].archived {
        return None;
    }
    let prev = list[prev_idx].clone();
    let current = list[idx].clone();
    let caret = char_len(&prev.text);

    list[prev_idx] = absorb(&prev, &current, &join_text(&prev.text, live_text));
    list.remove(idx);
    reindex_order(list);

    tracing::debug!(kept = %prev.id, removed = %current.id, "merge backward");
    Some(MergeOutcome {
        kept_id: prev.id.clone(),
        caret,
        action: UndoAction::Merge {
            direction: MergeDirection::Backward,
            kept_original: prev,
            removed: current,
            caret,
        },
    })
}

/// Delete at the end of `current_id`: it absorbs the next task.
///
/// No-op on the last row, or when either task is archived.
pub fn merge_forward(
    list: &mut Vec<Task>,
    current_id: &str,
    live_text: &str,
) -> Option<MergeOutcome> {
    let idx = find_index(list, current_id)?;
    let next_idx = idx + 1;
    if next_idx >= list.len() || list[idx].archived || list[next_idx].archived {
        return None;
    }
    let current = list[idx].clone();
    let next = list[next_idx].clone();
    let caret = char_len(live_text);

    list[idx] = absorb(&current, &next, &join_text(live_text, &next.text));
    list.remove(next_idx);
    reindex_order(list);

    tracing::debug!(kept = %current.id, removed = %next.id, "merge forward");
    Some(MergeOutcome {
        kept_id: current.id.clone(),
        caret,
        action: UndoAction::Merge {
            direction: MergeDirection::Forward,
            kept_original: current,
            removed: next,
            caret,
        },
    })
}

/// `kept` after swallowing `other`, with `joined` as the combined raw text
fn absorb(kept: &Task, other: &Task, joined: &str) -> Task {
    let ParsedInput {
        text,
        tags,
        intent,
        momentum,
    } = parse_task_input(joined);
    let mut merged = kept.clone();
    merged.text = text;
    merged.add_tags(&other.tags);
    merged.add_tags(&tags);
    merged.momentum = kept.momentum || other.momentum || momentum;
    merged.intent = intent.or(kept.intent);
    merged
}

/// Concatenate two texts, inserting one space at the seam when neither side
/// already has whitespace there
pub fn join_text(left: &str, right: &str) -> String {
    let needs_space = !left.is_empty()
        && !right.is_empty()
        && !left.ends_with(char::is_whitespace)
        && !right.starts_with(char::is_whitespace);
    if needs_space {
        format!("{} {}", left, right)
    } else {
        format!("{}{}", left, right)
    }
}

/// Create a task from the capture row and put it at the top.
///
/// Returns the new id, or None when the input has neither text nor tags.
pub fn commit_capture(
    list: &mut Vec<Task>,
    live_text: &str,
    default_intent: Intent,
    now_ms: i64,
) -> Option<String> {
    let parsed = parse_task_input(live_text);
    if parsed.text.is_empty() && parsed.tags.is_empty() {
        return None;
    }
    let id = new_task_id();
    let mut task = Task::new(id.clone(), parsed.text, now_ms);
    task.tags = parsed.tags;
    task.intent = Some(parsed.intent.unwrap_or(default_intent));
    task.momentum = parsed.momentum;
    list.insert(0, task);
    reindex_order(list);
    tracing::debug!(id = %id, "capture");
    Some(id)
}
