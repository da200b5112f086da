use std::path::PathBuf;

use super::config::ProjectConfig;

/// Directory under the project root that holds every outline file
pub const OUTLINE_DIR: &str = "outline";
pub const CONFIG_FILE: &str = "outline.toml";
pub const TASKS_FILE: &str = "tasks.json";
pub const BACKUP_FILE: &str = "tasks.backup.json";
pub const HISTORY_FILE: &str = "history.json";

/// A discovered outline project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of `outline/`)
    pub root: PathBuf,
    /// Path to the `outline/` directory
    pub outline_dir: PathBuf,
    /// Parsed outline.toml
    pub config: ProjectConfig,
}
