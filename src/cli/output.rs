use serde::Serialize;

use crate::model::config::ProjectConfig;
use crate::model::task::{Intent, Task};
use crate::ops::store::millis_to_iso;
use crate::util::unicode::truncate_to_width;

/// Characters of the id shown in text listings
pub const SHORT_ID_LEN: usize = 8;

/// Widest text column before truncation
const TEXT_WIDTH: usize = 72;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub text: String,
    pub indent: u8,
    pub order: i64,
    pub completed: bool,
    pub archived: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub momentum: bool,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub count: usize,
    pub tasks: Vec<TaskJson>,
}

/// Result of a mutating command
#[derive(Serialize)]
pub struct MutationJson {
    pub changed: bool,
    /// Task the host should focus next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskJson>,
}

#[derive(Serialize)]
pub struct UndoJson {
    pub undone: Option<String>,
    pub remaining: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        text: task.text.clone(),
        indent: task.indent,
        order: task.order,
        completed: task.completed,
        archived: task.archived,
        tags: task.tags.clone(),
        intent: task.intent,
        momentum: task.momentum,
        created: millis_to_iso(task.created_at),
        completed_at: task.completed_at.map(millis_to_iso),
        archived_at: task.archived_at.clone(),
    }
}

pub fn tasks_to_json<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> TaskListJson {
    let tasks: Vec<TaskJson> = tasks.into_iter().map(task_to_json).collect();
    TaskListJson {
        count: tasks.len(),
        tasks,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((byte, _)) => &id[..byte],
        None => id,
    }
}

fn checkbox(task: &Task) -> &'static str {
    if task.archived {
        "[-]"
    } else if task.completed {
        "[x]"
    } else {
        "[ ]"
    }
}

/// `7f3a9c1e  [ ]   Call mom  #family !soon !m`
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{:<width$}  {} {}{}",
        short_id(&task.id),
        checkbox(task),
        "  ".repeat(task.indent as usize),
        truncate_to_width(&task.text, TEXT_WIDTH),
        width = SHORT_ID_LEN,
    );
    let mut meta = Vec::new();
    meta.extend(task.tags.iter().map(|t| format!("#{}", t)));
    if let Some(intent) = task.intent {
        meta.push(format!("!{}", intent.as_str()));
    }
    if task.momentum {
        meta.push("!m".to_string());
    }
    if !meta.is_empty() {
        line.push_str("  ");
        line.push_str(&meta.join(" "));
    }
    line
}

/// Multi-line detail view for `ol show`
pub fn format_task_detail(task: &Task) -> String {
    let mut lines = vec![
        format!("id:       {}", task.id),
        format!("text:     {}", task.text),
        format!("indent:   {}", task.indent),
        format!("created:  {}", millis_to_iso(task.created_at)),
    ];
    if !task.tags.is_empty() {
        lines.push(format!("tags:     {}", task.tags.join(", ")));
    }
    if let Some(intent) = task.intent {
        lines.push(format!("intent:   {}", intent.as_str()));
    }
    if task.momentum {
        lines.push("momentum: yes".to_string());
    }
    if let Some(done) = task.completed_at {
        lines.push(format!("done:     {}", millis_to_iso(done)));
    }
    if let Some(archived) = &task.archived_at {
        lines.push(format!("archived: {}", archived));
    }
    lines.join("\n")
}

pub fn format_config(config: &ProjectConfig) -> String {
    [
        format!("project.name = {}", config.project.name),
        format!("undo.limit = {}", config.undo.limit),
        format!("drag.indent_width = {}", config.drag.indent_width),
        format!("drag.row_height = {}", config.drag.row_height),
        format!(
            "capture.default_intent = {}",
            config.capture.default_intent.as_str()
        ),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn sample() -> Task {
        let id = "7f3a9c1e-0000-4000-8000-000000000000";
        let mut task = Task::new(id.into(), "Call mom".into(), 0);
        task.tags = vec!["family".into()];
        task.intent = Some(Intent::Soon);
        task.momentum = true;
        task.indent = 1;
        task
    }

    #[test]
    fn task_line() {
        assert_snapshot!(
            format_task_line(&sample()),
            @"7f3a9c1e  [ ]   Call mom  #family !soon !m"
        );
    }

    #[test]
    fn task_line_plain() {
        let mut task = Task::new("ab".into(), "Done thing".into(), 0);
        task.completed = true;
        assert_snapshot!(format_task_line(&task), @"ab        [x] Done thing");
    }

    #[test]
    fn task_detail() {
        assert_snapshot!(format_task_detail(&sample()), @r"
        id:       7f3a9c1e-0000-4000-8000-000000000000
        text:     Call mom
        indent:   1
        created:  1970-01-01T00:00:00.000Z
        tags:     family
        intent:   soon
        momentum: yes
        ");
    }

    #[test]
    fn json_omits_absent_fields() {
        let task = Task::new("a".into(), "x".into(), 0);
        let json = serde_json::to_value(task_to_json(&task)).unwrap();
        assert!(json.get("intent").is_none());
        assert!(json.get("completed_at").is_none());
        assert_eq!(json["created"], "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
