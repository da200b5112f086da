use serde::{Deserialize, Serialize};

/// Deepest indent level a task may carry (0 = top level)
pub const MAX_INDENT: u8 = 2;

/// Manual priority bucket, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Now,
    Soon,
    Later,
}

impl Intent {
    /// The token word without the leading `!`
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Now => "now",
            Intent::Soon => "soon",
            Intent::Later => "later",
        }
    }

    /// Parse a bucket name, case-insensitive
    pub fn parse(s: &str) -> Option<Intent> {
        match s.to_ascii_lowercase().as_str() {
            "now" => Some(Intent::Now),
            "soon" => Some(Intent::Soon),
            "later" => Some(Intent::Later),
            _ => None,
        }
    }

    /// Sort rank of the bucket. Tasks without intent rank after `later`.
    pub fn rank(intent: Option<Intent>) -> u8 {
        match intent {
            Some(Intent::Now) => 0,
            Some(Intent::Soon) => 1,
            Some(Intent::Later) => 2,
            None => 3,
        }
    }
}

/// One row of the outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Display text with all metadata tokens stripped
    pub text: String,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Manual ordering key within a display bucket
    pub order: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub archived: bool,
    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    #[serde(default)]
    pub indent: u8,
    /// Lowercase, without the `#` prefix, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub momentum: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Task {
    /// Create an active, untagged task. `order` starts at the creation time
    /// and is replaced by the next reindex.
    pub fn new(id: String, text: String, now_ms: i64) -> Self {
        Task {
            id,
            text,
            created_at: now_ms,
            order: now_ms,
            completed: false,
            completed_at: None,
            archived: false,
            archived_at: None,
            indent: 0,
            tags: Vec::new(),
            intent: None,
            momentum: false,
        }
    }

    /// Set the indent, clamped to `[0, MAX_INDENT]`
    pub fn set_indent(&mut self, indent: i64) {
        self.indent = clamp_indent(indent);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('#');
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Union `tags` into this task's tags. Returns true if anything was added.
    pub fn add_tags<I, S>(&mut self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = false;
        for tag in tags {
            let tag = tag.as_ref().trim_start_matches('#').to_lowercase();
            if !tag.is_empty() && !self.tags.contains(&tag) {
                self.tags.push(tag);
                added = true;
            }
        }
        added
    }
}

/// Clamp any integer into the valid indent range
pub fn clamp_indent(indent: i64) -> u8 {
    indent.clamp(0, i64::from(MAX_INDENT)) as u8
}

/// A fresh, globally unique task id
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
