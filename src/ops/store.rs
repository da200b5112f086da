use std::collections::HashSet;
use std::ops::Range;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::model::task::{Intent, MAX_INDENT, Task, clamp_indent};
use crate::parse::strip_tag_tokens;

/// Error type for resolving user-supplied task ids
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id prefix {prefix} is ambiguous ({count} matches)")]
    Ambiguous { prefix: String, count: usize },
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turn one persisted task entry into a valid [`Task`].
///
/// Rejects entries without an `id` or `text`. Everything else is coerced:
/// indent is clamped, a missing `createdAt` becomes `now_ms`, a missing
/// `order` becomes `index`, archived tasks without `archivedAt` get one from
/// `createdAt`, and legacy inline `#tag` words in `text` move into `tags`.
/// The older `meta: { tags, intent }` mirror is read when the top-level
/// fields are absent.
pub fn normalize_task(raw: &Value, index: usize, now_ms: i64) -> Option<Task> {
    let obj = raw.as_object()?;
    let id = match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = obj.get("text")?.as_str()?;
    let meta = obj.get("meta").and_then(Value::as_object);

    let created_at = obj.get("createdAt").and_then(as_millis).unwrap_or(now_ms);
    let order = obj
        .get("order")
        .and_then(as_millis)
        .unwrap_or(index as i64);

    let mut task = Task::new(id, String::new(), created_at);
    task.order = order;
    task.completed = obj.get("completed").and_then(Value::as_bool).unwrap_or(false);
    task.completed_at = obj.get("completedAt").and_then(as_millis);
    task.archived = obj.get("archived").and_then(Value::as_bool).unwrap_or(false);
    task.archived_at = obj
        .get("archivedAt")
        .and_then(Value::as_str)
        .map(str::to_string);
    if task.archived && task.archived_at.is_none() {
        task.archived_at = Some(millis_to_iso(created_at));
    }
    task.indent = obj
        .get("indent")
        .and_then(as_millis)
        .map_or(0, clamp_indent);
    task.momentum = obj.get("momentum").and_then(Value::as_bool).unwrap_or(false);

    let tags = obj
        .get("tags")
        .or_else(|| meta.and_then(|m| m.get("tags")))
        .and_then(Value::as_array);
    if let Some(tags) = tags {
        task.add_tags(tags.iter().filter_map(Value::as_str));
    }
    task.intent = obj
        .get("intent")
        .or_else(|| meta.and_then(|m| m.get("intent")))
        .and_then(Value::as_str)
        .and_then(Intent::parse);

    let (clean_text, inline_tags) = strip_tag_tokens(text);
    task.text = clean_text;
    task.add_tags(inline_tags);

    Some(task)
}

/// Numbers in persisted payloads may arrive as floats
fn as_millis(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
}

/// Epoch milliseconds as an RFC 3339 UTC string
pub fn millis_to_iso(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn iso_to_millis(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.timestamp_millis())
}

/// Drop later tasks that reuse an earlier task's id
pub fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert(t.id.clone());
            if !fresh {
                tracing::warn!(id = %t.id, "dropping task with duplicate id");
            }
            fresh
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Display order: `now`, `soon`, `later`, untagged buckets by `order`, then
/// archived tasks by `archived_at` (falling back to `order`). Stable with
/// respect to the input order.
pub fn sort_for_display(list: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = list.iter().collect();
    sorted.sort_by_key(|t| display_key(t));
    sorted
}

fn display_key(task: &Task) -> (bool, u8, i64) {
    if task.archived {
        let at = task
            .archived_at
            .as_deref()
            .and_then(iso_to_millis)
            .unwrap_or(task.order);
        (true, 0, at)
    } else {
        (false, Intent::rank(task.intent), task.order)
    }
}

/// Stable-sort the active tasks by their stored `order`. Archived tasks keep
/// their array slots; the active ones are redistributed over the rest.
pub fn sort_active_by_order(list: &mut [Task]) {
    let slots: Vec<usize> = (0..list.len()).filter(|&i| !list[i].archived).collect();
    let mut active: Vec<Task> = slots.iter().map(|&i| list[i].clone()).collect();
    active.sort_by_key(|t| t.order);
    for (slot, task) in slots.into_iter().zip(active) {
        list[slot] = task;
    }
}

/// Set `order` to the array position of every active task. Archived tasks
/// keep their order.
pub fn reindex_order(list: &mut [Task]) {
    for (i, task) in list.iter_mut().enumerate() {
        if !task.archived {
            task.order = i as i64;
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_index(list: &[Task], id: &str) -> Option<usize> {
    list.iter().position(|t| t.id == id)
}

pub fn find_task<'a>(list: &'a [Task], id: &str) -> Option<&'a Task> {
    list.iter().find(|t| t.id == id)
}

/// Resolve a full id or a unique id prefix
pub fn resolve_id(list: &[Task], prefix: &str) -> Result<String, TaskError> {
    if let Some(task) = find_task(list, prefix) {
        return Ok(task.id.clone());
    }
    let matches: Vec<&Task> = list.iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [] => Err(TaskError::NotFound(prefix.to_string())),
        [only] => Ok(only.id.clone()),
        _ => Err(TaskError::Ambiguous {
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The block rooted at `index`: the task plus every following active task
/// indented deeper than it. An out-of-range index yields an empty range.
pub fn block_range(list: &[Task], index: usize) -> Range<usize> {
    let Some(root) = list.get(index) else {
        return index..index;
    };
    if root.archived {
        return index..index + 1;
    }
    let end = list[index + 1..]
        .iter()
        .position(|t| t.archived || t.indent <= root.indent)
        .map_or(list.len(), |offset| index + 1 + offset);
    index..end
}

/// Starting at `from`, pull active rows to at most one level below the
/// active row before them. Stops at the first row that already fits, so rows
/// further down keep their indent. Archived rows are skipped.
pub fn nest_under_predecessor(list: &mut [Task], from: usize) {
    let mut prev = list
        .get(..from.min(list.len()))
        .and_then(|head| head.iter().rev().find(|t| !t.archived))
        .map(|t| t.indent);
    for task in list.iter_mut().skip(from).filter(|t| !t.archived) {
        let limit = prev.map_or(0, |indent| (indent + 1).min(MAX_INDENT));
        if task.indent <= limit {
            break;
        }
        task.indent = limit;
        prev = Some(limit);
    }
}

/// Deepest member indent relative to the block root
pub fn max_relative_offset(list: &[Task], block: Range<usize>) -> u8 {
    let Some(root) = list.get(block.start) else {
        return 0;
    };
    list[block]
        .iter()
        .map(|t| t.indent.saturating_sub(root.indent))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, indent: u8) -> Task {
        let mut t = Task::new(id.into(), id.to_uppercase(), 0);
        t.indent = indent;
        t
    }

    #[test]
    fn normalize_rejects_missing_id_or_text() {
        assert!(normalize_task(&json!({"text": "x"}), 0, 0).is_none());
        assert!(normalize_task(&json!({"id": "a"}), 0, 0).is_none());
        assert!(normalize_task(&json!({"id": "", "text": "x"}), 0, 0).is_none());
        assert!(normalize_task(&json!("nope"), 0, 0).is_none());
    }

    #[test]
    fn normalize_fills_fallbacks() {
        let task = normalize_task(&json!({"id": "a", "text": "x", "indent": 9}), 4, 1234).unwrap();
        assert_eq!(task.created_at, 1234);
        assert_eq!(task.order, 4);
        assert_eq!(task.indent, 2);
        assert!(!task.completed);
        let task = normalize_task(&json!({"id": 7, "text": "x", "indent": -1}), 0, 0).unwrap();
        assert_eq!(task.id, "7");
        assert_eq!(task.indent, 0);
    }

    #[test]
    fn normalize_backfills_archived_at() {
        let task = normalize_task(
            &json!({"id": "a", "text": "x", "archived": true, "createdAt": 0}),
            0,
            99,
        )
        .unwrap();
        assert_eq!(task.archived_at.as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn normalize_migrates_inline_tags() {
        let task = normalize_task(
            &json!({"id": "a", "text": "Buy milk #Errand", "tags": ["home"]}),
            0,
            0,
        )
        .unwrap();
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.tags, vec!["home", "errand"]);
    }

    #[test]
    fn normalize_reads_legacy_meta_mirror() {
        let task = normalize_task(
            &json!({"id": "a", "text": "x", "meta": {"tags": ["Work"], "intent": "later"}}),
            0,
            0,
        )
        .unwrap();
        assert_eq!(task.tags, vec!["work"]);
        assert_eq!(task.intent, Some(Intent::Later));
    }

    #[test]
    fn normalize_drops_unknown_intent() {
        let raw = json!({"id": "a", "text": "x", "intent": "asap"});
        let task = normalize_task(&raw, 0, 0).unwrap();
        assert_eq!(task.intent, None);
    }

    #[test]
    fn dedup_keeps_first() {
        let tasks = vec![task("a", 0), task("b", 0), task("a", 1)];
        let deduped = dedup_ids(tasks);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].indent, 0);
    }

    #[test]
    fn sort_buckets_then_order_then_archived() {
        let mut later = task("later", 0);
        later.intent = Some(Intent::Later);
        later.order = 0;
        let mut none = task("none", 0);
        none.order = 1;
        let mut now_b = task("now_b", 0);
        now_b.intent = Some(Intent::Now);
        now_b.order = 5;
        let mut now_a = task("now_a", 0);
        now_a.intent = Some(Intent::Now);
        now_a.order = 2;
        let mut arch_new = task("arch_new", 0);
        arch_new.archived = true;
        arch_new.archived_at = Some("2024-02-01T00:00:00.000Z".into());
        arch_new.intent = Some(Intent::Now);
        let mut arch_old = task("arch_old", 0);
        arch_old.archived = true;
        arch_old.archived_at = Some("2024-01-01T00:00:00.000Z".into());
        let mut soon = task("soon", 0);
        soon.intent = Some(Intent::Soon);
        soon.order = 9;

        let list = vec![arch_new, later, none, now_b, arch_old, now_a, soon];
        let ids: Vec<&str> = sort_for_display(&list).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["now_a", "now_b", "soon", "later", "none", "arch_old", "arch_new"]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_order() {
        let list = vec![task("x", 0), task("y", 0), task("z", 0)];
        let ids: Vec<&str> = sort_for_display(&list).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn reindex_skips_archived() {
        let mut list = vec![task("a", 0), task("b", 0), task("c", 0)];
        list[1].archived = true;
        list[1].order = 77;
        list[2].order = 50;
        reindex_order(&mut list);
        assert_eq!(list[0].order, 0);
        assert_eq!(list[1].order, 77);
        assert_eq!(list[2].order, 2);
    }

    #[test]
    fn block_covers_deeper_followers() {
        let list = vec![
            task("a", 0),
            task("b", 1),
            task("c", 2),
            task("d", 1),
            task("e", 0),
        ];
        assert_eq!(block_range(&list, 0), 0..4);
        assert_eq!(block_range(&list, 1), 1..3);
        assert_eq!(block_range(&list, 2), 2..3);
        assert_eq!(block_range(&list, 4), 4..5);
        assert_eq!(block_range(&list, 9), 9..9);
        assert_eq!(max_relative_offset(&list, 0..4), 2);
        assert_eq!(max_relative_offset(&list, 1..3), 1);
    }

    #[test]
    fn archived_task_ends_a_block() {
        let mut list = vec![task("a", 0), task("b", 1), task("c", 1)];
        list[1].archived = true;
        assert_eq!(block_range(&list, 0), 0..1);
    }

    #[test]
    fn resolve_id_by_prefix() {
        let list = vec![task("abc1", 0), task("abd2", 0)];
        assert_eq!(resolve_id(&list, "abc").unwrap(), "abc1");
        assert_eq!(resolve_id(&list, "abd2").unwrap(), "abd2");
        assert!(matches!(
            resolve_id(&list, "ab"),
            Err(TaskError::Ambiguous { count: 2, .. })
        ));
        assert!(matches!(resolve_id(&list, "zz"), Err(TaskError::NotFound(_))));
    }

    #[test]
    fn sort_active_keeps_archived_slots() {
        let mut list = vec![task("a", 0), task("x", 0), task("b", 0), task("c", 0)];
        list[0].order = 5;
        list[1].archived = true;
        list[1].order = 0;
        list[2].order = 1;
        list[3].order = 1;
        sort_active_by_order(&mut list);
        let ids: Vec<&str> = list.iter().map(|t| t.id.as_str()).collect();
        // b and c tie on order and keep their relative position
        assert_eq!(ids, vec!["b", "x", "c", "a"]);
    }

    #[test]
    fn nesting_stops_at_first_fitting_row() {
        let mut list = vec![task("a", 0), task("b", 2), task("c", 2), task("d", 0), task("e", 2)];
        list[2].archived = true;
        nest_under_predecessor(&mut list, 1);
        let indents: Vec<u8> = list.iter().map(|t| t.indent).collect();
        // c is archived and skipped; e is past d, which already fit
        assert_eq!(indents, vec![0, 1, 2, 0, 2]);
    }

    #[test]
    fn nesting_from_the_top_forces_zero() {
        let mut list = vec![task("a", 1), task("b", 2), task("c", 1)];
        nest_under_predecessor(&mut list, 0);
        let indents: Vec<u8> = list.iter().map(|t| t.indent).collect();
        assert_eq!(indents, vec![0, 1, 1]);
    }
}
