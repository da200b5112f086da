use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io;
use crate::model::config::ProjectConfig;
use crate::model::project::{CONFIG_FILE, OUTLINE_DIR, Project};

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not an outline project: no outline/ directory found")]
    NotAProject,
    #[error("already an outline project: {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse outline.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit outline.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the outline project by walking up from the given directory,
/// looking for an `outline/` subdirectory holding `outline.toml`.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let outline_dir = current.join(OUTLINE_DIR);
        if outline_dir.is_dir() && outline_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Load the project config from the given root directory.
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let outline_dir = root.join(OUTLINE_DIR);
    if !outline_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }
    let (config, _) = config_io::read_config(&outline_dir)?;
    Ok(Project {
        root: root.to_path_buf(),
        outline_dir,
        config,
    })
}

const CONFIG_TEMPLATE: &str = r##"[project]
name = "outline"

[undo]
# oldest entries are dropped past this many
limit = 500

[drag]
# pointer travel, in pixels, for one indent level
indent_width = 24.0
# row height assumed by `ol mv`
row_height = 28.0

[capture]
# intent given to new tasks without a !now/!soon/!later token
default_intent = "now"
"##;

/// Create `outline/` with a fresh outline.toml under `root`.
pub fn init_project(root: &Path, name: &str) -> Result<Project, ProjectError> {
    let outline_dir = root.join(OUTLINE_DIR);
    if outline_dir.join(CONFIG_FILE).exists() {
        return Err(ProjectError::AlreadyExists(outline_dir));
    }
    fs::create_dir_all(&outline_dir)?;
    let mut doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    doc["project"]["name"] = toml_edit::value(name);
    let config: ProjectConfig = toml::from_str(&doc.to_string())?;
    config_io::write_config(&outline_dir, &doc)?;
    tracing::info!(root = %root.display(), name, "initialized project");
    Ok(Project {
        root: root.to_path_buf(),
        outline_dir,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_project() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), "home").unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_project(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn test_discover_project_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_project(tmp.path()),
            Err(ProjectError::NotAProject)
        ));
    }

    #[test]
    fn test_init_then_load() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), "errands").unwrap();
        let project = load_project(tmp.path()).unwrap();
        assert_eq!(project.config.project.name, "errands");
        assert_eq!(project.config.undo.limit, 500);
        assert!(matches!(
            init_project(tmp.path(), "again"),
            Err(ProjectError::AlreadyExists(_))
        ));
    }
}
