use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::model::project::{BACKUP_FILE, TASKS_FILE};
use crate::model::task::Task;
use crate::ops::store::{dedup_ids, normalize_task};

pub const PAYLOAD_VERSION: u64 = 1;

/// Error type for writing the task store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Serialize)]
struct StorePayload<'a> {
    version: u64,
    tasks: &'a [Task],
}

/// Which copy a load came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Backup,
    /// Neither copy was readable
    Empty,
}

#[derive(Debug, Clone)]
pub struct LoadedTasks {
    pub tasks: Vec<Task>,
    pub source: LoadSource,
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize the list and write it to the backup, then to the primary.
pub fn save_tasks(outline_dir: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let payload = StorePayload {
        version: PAYLOAD_VERSION,
        tasks,
    };
    let mut content = serde_json::to_vec_pretty(&payload)?;
    content.push(b'\n');
    for name in [BACKUP_FILE, TASKS_FILE] {
        let path = outline_dir.join(name);
        atomic_write(&path, &content).map_err(|source| StoreError::Write { path, source })?;
    }
    tracing::info!(count = tasks.len(), "saved tasks");
    Ok(())
}

/// Load the list: primary, then backup, then empty. Never fails.
pub fn load_tasks(outline_dir: &Path, now_ms: i64) -> LoadedTasks {
    let primary = outline_dir.join(TASKS_FILE);
    if let Some(tasks) = read_payload(&primary, now_ms) {
        tracing::info!(count = tasks.len(), "loaded tasks");
        return LoadedTasks {
            tasks,
            source: LoadSource::Primary,
        };
    }
    let backup = outline_dir.join(BACKUP_FILE);
    if let Some(tasks) = read_payload(&backup, now_ms) {
        tracing::warn!(path = %primary.display(), "primary store unreadable, loaded backup");
        return LoadedTasks {
            tasks,
            source: LoadSource::Backup,
        };
    }
    if primary.exists() || backup.exists() {
        tracing::warn!("no readable task store, starting empty");
    }
    LoadedTasks {
        tasks: Vec::new(),
        source: LoadSource::Empty,
    }
}

fn read_payload(path: &Path, now_ms: i64) -> Option<Vec<Task>> {
    let text = fs::read_to_string(path).ok()?;
    match parse_payload(&text, now_ms) {
        Some(tasks) => Some(tasks),
        None => {
            tracing::warn!(path = %path.display(), "malformed task store");
            None
        }
    }
}

/// Parse a `{version, tasks}` payload. None if the JSON is corrupt, the
/// shape is wrong, or the version is newer than this build understands.
/// Invalid entries inside a well-formed payload are dropped, not fatal.
pub fn parse_payload(text: &str, now_ms: i64) -> Option<Vec<Task>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    if let Some(version) = obj.get("version") {
        if version.as_u64()? > PAYLOAD_VERSION {
            return None;
        }
    }
    let raw = obj.get("tasks")?.as_array()?;
    let mut tasks = Vec::with_capacity(raw.len());
    for (i, entry) in raw.iter().enumerate() {
        match normalize_task(entry, i, now_ms) {
            Some(task) => tasks.push(task),
            None => tracing::warn!(index = i, "dropped invalid task entry"),
        }
    }
    Some(dedup_ids(tasks))
}
