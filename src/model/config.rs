use serde::{Deserialize, Serialize};

use crate::model::task::Intent;

/// Configuration from outline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        ProjectInfo {
            name: default_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Oldest entries are dropped past this many
    #[serde(default = "default_undo_limit")]
    pub limit: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        UndoConfig {
            limit: default_undo_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragConfig {
    /// Horizontal pointer travel, in pixels, for one indent level
    #[serde(default = "default_indent_width")]
    pub indent_width: f64,
    /// Row height used by the synthetic layout of the CLI `mv` command
    #[serde(default = "default_row_height")]
    pub row_height: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            indent_width: default_indent_width(),
            row_height: default_row_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Bucket given to captured tasks that carry no intent token
    #[serde(default = "default_intent")]
    pub default_intent: Intent,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            default_intent: default_intent(),
        }
    }
}

fn default_name() -> String {
    "outline".to_string()
}

fn default_undo_limit() -> usize {
    500
}

fn default_indent_width() -> f64 {
    24.0
}

fn default_row_height() -> f64 {
    28.0
}

fn default_intent() -> Intent {
    Intent::Now
}
