use crate::model::task::{Intent, MAX_INDENT, Task};
use crate::ops::store::{find_index, millis_to_iso, reindex_order};
use crate::ops::undo::UndoAction;

/// Which undo variant a single-task mutation records
#[derive(Debug, Clone, Copy)]
enum SnapshotKind {
    Edit,
    Toggle,
    Indent,
}

/// Run `f` on the task with `id`. Returns the pre-mutation snapshot wrapped
/// in the requested undo variant, or None if the task is missing or `f` left
/// it unchanged.
fn mutate_task(
    list: &mut [Task],
    id: &str,
    kind: SnapshotKind,
    f: impl FnOnce(&mut Task),
) -> Option<UndoAction> {
    let idx = find_index(list, id)?;
    let snapshot = list[idx].clone();
    f(&mut list[idx]);
    if list[idx] == snapshot {
        return None;
    }
    Some(match kind {
        SnapshotKind::Edit => UndoAction::Edit { task: snapshot },
        SnapshotKind::Toggle => UndoAction::Toggle { task: snapshot },
        SnapshotKind::Indent => UndoAction::Indent { task: snapshot },
    })
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Flip `completed`, stamping or clearing `completed_at`
pub fn toggle_completed(list: &mut [Task], id: &str, now_ms: i64) -> Option<UndoAction> {
    mutate_task(list, id, SnapshotKind::Toggle, |task| {
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(now_ms);
    })
}

pub fn toggle_momentum(list: &mut [Task], id: &str) -> Option<UndoAction> {
    mutate_task(list, id, SnapshotKind::Toggle, |task| {
        task.momentum = !task.momentum;
    })
}

// ---------------------------------------------------------------------------
// Indent
// ---------------------------------------------------------------------------

/// Tab: one level deeper, up to MAX_INDENT
pub fn indent(list: &mut [Task], id: &str) -> Option<UndoAction> {
    mutate_task(list, id, SnapshotKind::Indent, |task| {
        task.indent = (task.indent + 1).min(MAX_INDENT);
    })
}

/// Shift+Tab: one level shallower, down to 0
pub fn outdent(list: &mut [Task], id: &str) -> Option<UndoAction> {
    mutate_task(list, id, SnapshotKind::Indent, |task| {
        task.indent = task.indent.saturating_sub(1);
    })
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

pub fn set_intent(list: &mut [Task], id: &str, intent: Option<Intent>) -> Option<UndoAction> {
    mutate_task(list, id, SnapshotKind::Edit, |task| {
        task.intent = intent;
    })
}

/// Drop one tag. Removing a tag the task doesn't carry is a no-op.
pub fn remove_tag(list: &mut [Task], id: &str, tag: &str) -> Option<UndoAction> {
    let tag = tag.trim_start_matches('#').to_lowercase();
    mutate_task(list, id, SnapshotKind::Edit, |task| {
        task.tags.retain(|t| *t != tag);
    })
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

/// Soft removal: the task stays in the store, sorted after every active
/// task. Unarchiving puts it back into manual order at its array position.
pub fn set_archived(
    list: &mut [Task],
    id: &str,
    archived: bool,
    now_ms: i64,
) -> Option<UndoAction> {
    let action = mutate_task(list, id, SnapshotKind::Edit, |task| {
        if task.archived == archived {
            return;
        }
        task.archived = archived;
        task.archived_at = archived.then(|| millis_to_iso(now_ms));
    })?;
    if !archived {
        reindex_order(list);
    }
    Some(action)
}

/// Hard removal, recoverable only through undo
pub fn delete_task(list: &mut Vec<Task>, id: &str) -> Option<UndoAction> {
    let index = find_index(list, id)?;
    let task = list.remove(index);
    reindex_order(list);
    tracing::debug!(id = %task.id, index, "delete");
    Some(UndoAction::Delete { task, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::undo::apply;
    use pretty_assertions::assert_eq;

    fn sample_list() -> Vec<Task> {
        let mut list: Vec<Task> = (0..5)
            .map(|i| {
                let mut t = Task::new(format!("t{}", i), format!("Task {}", i), 100 + i);
                t.tags.push("work".into());
                t
            })
            .collect();
        reindex_order(&mut list);
        list
    }

    #[test]
    fn toggle_completed_stamps_and_clears() {
        let mut list = sample_list();
        let action = toggle_completed(&mut list, "t1", 500).unwrap();
        assert!(list[1].completed);
        assert_eq!(list[1].completed_at, Some(500));
        assert!(matches!(action, UndoAction::Toggle { .. }));
        toggle_completed(&mut list, "t1", 600).unwrap();
        assert!(!list[1].completed);
        assert_eq!(list[1].completed_at, None);
    }

    #[test]
    fn toggle_momentum_flips() {
        let mut list = sample_list();
        toggle_momentum(&mut list, "t0").unwrap();
        assert!(list[0].momentum);
        toggle_momentum(&mut list, "t0").unwrap();
        assert!(!list[0].momentum);
    }

    #[test]
    fn indent_clamps_at_bounds() {
        let mut list = sample_list();
        assert!(outdent(&mut list, "t0").is_none());
        assert!(indent(&mut list, "t0").is_some());
        assert!(indent(&mut list, "t0").is_some());
        assert_eq!(list[0].indent, MAX_INDENT);
        assert!(indent(&mut list, "t0").is_none());
        assert!(matches!(outdent(&mut list, "t0"), Some(UndoAction::Indent { .. })));
        assert_eq!(list[0].indent, 1);
    }

    #[test]
    fn remove_missing_tag_is_noop() {
        let mut list = sample_list();
        assert!(remove_tag(&mut list, "t2", "home").is_none());
        assert!(remove_tag(&mut list, "t2", "#Work").is_some());
        assert!(list[2].tags.is_empty());
    }

    #[test]
    fn set_intent_records_edit() {
        let mut list = sample_list();
        let action = set_intent(&mut list, "t3", Some(Intent::Later)).unwrap();
        assert_eq!(list[3].intent, Some(Intent::Later));
        assert!(set_intent(&mut list, "t3", Some(Intent::Later)).is_none());
        apply(&mut list, &action);
        assert_eq!(list[3].intent, None);
    }

    #[test]
    fn archive_round_trip() {
        let mut list = sample_list();
        let before = list.clone();
        let action = set_archived(&mut list, "t2", true, 0).unwrap();
        assert!(list[2].archived);
        assert_eq!(list[2].archived_at.as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert!(set_archived(&mut list, "t2", true, 5).is_none());
        apply(&mut list, &action);
        assert_eq!(list, before);
    }

    #[test]
    fn delete_then_undo_restores_index_and_fields() {
        let mut list = sample_list();
        let before = list.clone();
        let action = delete_task(&mut list, "t2").unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[2].id, "t3");
        assert_eq!(list[2].order, 2);
        apply(&mut list, &action);
        assert_eq!(list, before);
        assert_eq!(list[2].id, "t2");
    }

    #[test]
    fn missing_id_is_noop_everywhere() {
        let mut list = sample_list();
        let before = list.clone();
        assert!(toggle_completed(&mut list, "nope", 0).is_none());
        assert!(toggle_momentum(&mut list, "nope").is_none());
        assert!(indent(&mut list, "nope").is_none());
        assert!(set_archived(&mut list, "nope", true, 0).is_none());
        assert!(delete_task(&mut list, "nope").is_none());
        assert_eq!(list, before);
    }
}
