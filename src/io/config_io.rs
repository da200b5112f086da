use std::fs;
use std::path::Path;

use crate::io::project_io::ProjectError;
use crate::model::config::ProjectConfig;
use crate::model::project::CONFIG_FILE;

/// Keys `set_value` accepts, as `section.key`
pub const KNOWN_KEYS: &[&str] = &[
    "project.name",
    "undo.limit",
    "drag.indent_width",
    "drag.row_height",
    "capture.default_intent",
];

/// Read the project config, returning both the parsed config and the raw
/// toml_edit Document for round-trip-safe editing.
pub fn read_config(
    outline_dir: &Path,
) -> Result<(ProjectConfig, toml_edit::DocumentMut), ProjectError> {
    let config_path = outline_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: ProjectConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(outline_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ProjectError> {
    let config_path = outline_dir.join(CONFIG_FILE);
    fs::write(&config_path, doc.to_string()).map_err(|e| ProjectError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Set `section.key` to `raw`, typed after the key. The edited document is
/// re-parsed so a value of the wrong shape is rejected before it is written.
pub fn set_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    raw: &str,
) -> Result<ProjectConfig, ProjectError> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(ProjectError::UnknownKey(key.to_string()));
    }
    let Some((section, field)) = key.split_once('.') else {
        return Err(ProjectError::UnknownKey(key.to_string()));
    };
    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = match key {
        "undo.limit" => match raw.parse::<i64>() {
            Ok(n) => toml_edit::value(n),
            Err(_) => toml_edit::value(raw),
        },
        "drag.indent_width" | "drag.row_height" => match raw.parse::<f64>() {
            Ok(n) => toml_edit::value(n),
            Err(_) => toml_edit::value(raw),
        },
        "capture.default_intent" => toml_edit::value(raw.to_lowercase()),
        _ => toml_edit::value(raw),
    };
    let config: ProjectConfig = toml::from_str(&doc.to_string())?;
    Ok(config)
}
