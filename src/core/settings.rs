//! # Settings Store
//!
//! Loads the three configuration layers (built-in defaults, the global settings
//! file, the project settings file) and folds them into one [`EffectiveConfig`].
//!
//! Precedence is per field, later layers winning:
//! 1. Defaults
//! 2. Global file (`$TOFFEE_CONFIG` or `~/.config/toffee/config.toml`)
//! 3. Project file (`<project root>/.toffee.toml`)
//!
//! Missing files are not an error. A present file that is not valid TOML, or
//! whose fields have the wrong type, is. Unknown keys only produce warnings,
//! except through [`SettingsStore::set_value`], which rejects them.
use crate::{
    core::paths::{self, PathError},
    models::{ConfigKey, EffectiveConfig, Scope, SettingSource, SettingsLayer},
};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid settings file '{path}'{}: {message}", format_position(.line, .column))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },
    #[error("Unknown configuration key '{key}'. Valid keys: {valid}")]
    UnknownKey { key: String, valid: String },
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: ConfigKey,
        value: String,
        reason: String,
    },
    #[error("Failed to write settings file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("A project settings file already exists at '{path}'.")]
    AlreadyExists { path: PathBuf },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Path(#[from] PathError),
}

fn format_position(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" (line {}, column {})", line, column),
        (Some(line), None) => format!(" (line {})", line),
        _ => String::new(),
    }
}

/// A recoverable oddity found while loading a settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsWarning {
    pub path: PathBuf,
    pub key: String,
}

impl fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown key '{}' in '{}' was ignored (valid keys: {})",
            self.key,
            self.path.display(),
            ConfigKey::valid_keys()
        )
    }
}

/// One settings file as it was found on disk.
#[derive(Debug, Clone, Default)]
pub struct LayerFile {
    pub path: PathBuf,
    pub present: bool,
    pub layer: SettingsLayer,
}

/// The merged configuration together with where each piece came from.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub config: EffectiveConfig,
    pub global: LayerFile,
    pub project: LayerFile,
    pub warnings: Vec<SettingsWarning>,
}

impl LoadedSettings {
    /// Reports which layer supplied the effective value of `key`.
    pub fn source(&self, key: ConfigKey) -> SettingSource {
        if self.project.layer.defines(key) {
            SettingSource::Project
        } else if self.global.layer.defines(key) {
            SettingSource::Global
        } else {
            SettingSource::Default
        }
    }
}

/// Folds the global and project layers over the defaults.
///
/// Pure: the same two layers always produce the same configuration.
pub fn merge_layers(global: &SettingsLayer, project: &SettingsLayer) -> EffectiveConfig {
    let mut config = EffectiveConfig::default();
    for layer in [global, project] {
        if let Some(dir) = &layer.variables_directory {
            config.variables_directory = PathBuf::from(dir);
        }
        if let Some(tool) = &layer.tool_executable_path {
            config.tool_executable_path = tool.clone();
        }
        if let Some(env) = &layer.default_environment {
            config.default_environment = Some(env.clone());
        }
        if let Some(auto_approve) = layer.auto_approve {
            config.auto_approve = auto_approve;
        }
        if let Some(verbose) = layer.verbose {
            config.verbose = verbose;
        }
    }
    config
}

/// Reads and writes the two settings files of one project.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    global_path: PathBuf,
    project_root: PathBuf,
}

impl SettingsStore {
    pub fn new(global_path: PathBuf, project_root: PathBuf) -> Self {
        Self {
            global_path,
            project_root,
        }
    }

    /// Creates a store for `project_root` using the well-known global settings path.
    pub fn discover(project_root: &Path) -> Result<Self, SettingsError> {
        Ok(Self::new(
            paths::global_settings_path()?,
            project_root.to_path_buf(),
        ))
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn project_path(&self) -> PathBuf {
        paths::project_settings_path(&self.project_root)
    }

    pub fn path_for(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::Global => self.global_path.clone(),
            Scope::Project => self.project_path(),
        }
    }

    /// Loads both files and merges them over the defaults.
    pub fn load(&self) -> Result<LoadedSettings, SettingsError> {
        let mut warnings = Vec::new();
        let global = read_layer_file(&self.global_path, &mut warnings)?;
        let project = read_layer_file(&self.project_path(), &mut warnings)?;

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let config = merge_layers(&global.layer, &project.layer);
        log::debug!("Effective config: {:?}", config);

        Ok(LoadedSettings {
            config,
            global,
            project,
            warnings,
        })
    }

    /// Sets a single key in one settings file, keeping every other key as it was.
    ///
    /// `default_environment` accepts `none`/`null` to remove the key.
    /// Returns the path of the file that was written.
    pub fn set_value(&self, key: &str, value: &str, scope: Scope) -> Result<PathBuf, SettingsError> {
        let config_key = ConfigKey::from_name(key).ok_or_else(|| SettingsError::UnknownKey {
            key: key.to_string(),
            valid: ConfigKey::valid_keys(),
        })?;
        let typed = coerce_value(config_key, value)?;

        let path = self.path_for(scope);
        let mut table = match read_optional(&path)? {
            Some(content) => parse_table(&path, &content)?,
            None => toml::Table::new(),
        };

        match typed {
            Some(typed) => {
                table.insert(config_key.as_str().to_string(), typed);
            }
            None => {
                table.remove(config_key.as_str());
            }
        }

        let contents = toml::to_string_pretty(&table)?;
        write_atomic(&path, &contents)?;
        log::debug!("Set '{}' in {}", config_key, path.display());
        Ok(path)
    }

    /// Writes a starter project settings file.
    pub fn init_project(&self, force: bool) -> Result<PathBuf, SettingsError> {
        let path = self.project_path();
        if path.exists() && !force {
            return Err(SettingsError::AlreadyExists { path });
        }

        let defaults = EffectiveConfig::default();
        let starter = SettingsLayer {
            variables_directory: Some(defaults.variables_directory.display().to_string()),
            tool_executable_path: Some(defaults.tool_executable_path),
            ..Default::default()
        };
        let contents = toml::to_string_pretty(&starter)?;
        write_atomic(&path, &contents)?;
        Ok(path)
    }
}

// --- Helper Functions ---

fn read_optional(path: &Path) -> Result<Option<String>, SettingsError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn read_layer_file(
    path: &Path,
    warnings: &mut Vec<SettingsWarning>,
) -> Result<LayerFile, SettingsError> {
    let Some(content) = read_optional(path)? else {
        log::debug!("No settings file at {}", path.display());
        return Ok(LayerFile {
            path: path.to_path_buf(),
            present: false,
            layer: SettingsLayer::default(),
        });
    };

    log::debug!("Reading settings from {}", path.display());
    let table = parse_table(path, &content)?;

    for key in table.keys() {
        if ConfigKey::from_name(key).is_none() {
            warnings.push(SettingsWarning {
                path: path.to_path_buf(),
                key: key.clone(),
            });
        }
    }

    let mut layer: SettingsLayer =
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| SettingsError::Parse {
                path: path.to_path_buf(),
                line: None,
                column: None,
                message: e.message().to_string(),
            })?;

    if let Some(dir) = layer.variables_directory.as_deref() {
        layer.variables_directory = Some(paths::expand_setting_path(dir)?);
    }
    if let Some(tool) = layer.tool_executable_path.as_deref() {
        layer.tool_executable_path = Some(paths::expand_setting_path(tool)?);
    }

    Ok(LayerFile {
        path: path.to_path_buf(),
        present: true,
        layer,
    })
}

fn parse_table(path: &Path, content: &str) -> Result<toml::Table, SettingsError> {
    toml::from_str::<toml::Table>(content).map_err(|e| {
        let position = e.span().map(|span| line_and_column(content, span.start));
        SettingsError::Parse {
            path: path.to_path_buf(),
            line: position.map(|(line, _)| line),
            column: position.map(|(_, column)| column),
            message: e.message().trim().to_string(),
        }
    })
}

/// Converts a byte offset into 1-based line and column numbers.
fn line_and_column(content: &str, offset: usize) -> (usize, usize) {
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}

fn coerce_value(key: ConfigKey, raw: &str) -> Result<Option<toml::Value>, SettingsError> {
    let value = raw.trim();
    let invalid = |reason: &str| SettingsError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    if key.is_boolean() {
        return match value.to_lowercase().as_str() {
            "true" | "yes" | "y" | "t" | "1" => Ok(Some(toml::Value::Boolean(true))),
            "false" | "no" | "n" | "f" | "0" => Ok(Some(toml::Value::Boolean(false))),
            _ => Err(invalid("expected 'true' or 'false'")),
        };
    }

    if key == ConfigKey::DefaultEnvironment
        && matches!(value.to_lowercase().as_str(), "none" | "null")
    {
        return Ok(None);
    }

    if value.is_empty() {
        return Err(invalid("value cannot be empty"));
    }
    Ok(Some(toml::Value::String(value.to_string())))
}

/// Writes through a temp file in the same directory so a crash never leaves half a file.
fn write_atomic(path: &Path, contents: &str) -> Result<(), SettingsError> {
    let write_error = |source: io::Error| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_error)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
