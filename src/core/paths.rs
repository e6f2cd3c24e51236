// src/core/paths.rs

use crate::constants::{
    GLOBAL_SETTINGS_DIR, GLOBAL_SETTINGS_ENV_VAR, GLOBAL_SETTINGS_FILENAME,
    PROJECT_SETTINGS_FILENAME, TOOL_CONFIG_EXTENSION,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
}

/// Returns the path of the global settings file.
///
/// `$TOFFEE_CONFIG` wins when set; otherwise `~/.config/toffee/config.toml`
/// (or the platform equivalent). The file itself may not exist.
pub fn global_settings_path() -> Result<PathBuf, PathError> {
    if let Some(explicit) = std::env::var_os(GLOBAL_SETTINGS_ENV_VAR) {
        if !explicit.is_empty() {
            return Ok(PathBuf::from(explicit));
        }
    }
    let config_dir = dirs::config_dir().ok_or(PathError::ConfigDirNotFound)?;
    Ok(config_dir
        .join(GLOBAL_SETTINGS_DIR)
        .join(GLOBAL_SETTINGS_FILENAME))
}

/// Returns the path of the project settings file for a project root.
pub fn project_settings_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_SETTINGS_FILENAME)
}

/// Finds the project root for a starting directory.
///
/// Walks up from `start` (inclusive) looking for a `.toffee.toml`; failing that,
/// for the nearest directory holding `*.tf` files; failing that, `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    let start = dunce::simplified(start);

    if let Some(dir) = start
        .ancestors()
        .find(|dir| project_settings_path(dir).is_file())
    {
        log::debug!("Project root (settings file): {}", dir.display());
        return dir.to_path_buf();
    }

    if let Some(dir) = start.ancestors().find(|dir| contains_tool_config(dir)) {
        log::debug!("Project root (tool configuration): {}", dir.display());
        return dir.to_path_buf();
    }

    log::debug!("No project markers found, using {}", start.display());
    start.to_path_buf()
}

fn contains_tool_config(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == TOOL_CONFIG_EXTENSION)
    })
}

/// Expands `~` and environment variables in a path taken from a settings file.
pub fn expand_setting_path(raw: &str) -> Result<String, PathError> {
    shellexpand::full(raw)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| PathError::Expansion {
            path: raw.to_string(),
            message: e.to_string(),
        })
}

/// Renders `path` relative to `base` when it lives underneath it, unchanged otherwise.
pub fn display_relative(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
