// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// --- ENVIRONMENT MODELS ---

/// A usable deployment environment: both of its files exist and are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDefinition {
    pub name: String,
    pub variables_file: PathBuf,
    pub backend_file: PathBuf,
}

impl EnvironmentDefinition {
    /// Returns the path of the requested side of the pair.
    pub fn file(&self, kind: FileKind) -> &Path {
        match kind {
            FileKind::Variables => &self.variables_file,
            FileKind::Backend => &self.backend_file,
        }
    }
}

/// The two files that make up an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileKind {
    Variables,
    Backend,
}

impl FileKind {
    pub const ALL: [Self; 2] = [Self::Variables, Self::Backend];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Variables => crate::constants::VARIABLES_EXTENSION,
            Self::Backend => crate::constants::BACKEND_EXTENSION,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Variables => "variables",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the catalog found on disk for one side of an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Present {
        size: u64,
        modified: Option<SystemTime>,
    },
    Empty,
    Missing,
}

impl FileState {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    pub fn exists(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Why an environment file cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileProblem {
    Missing,
    Empty,
}

impl fmt::Display for FileProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

/// One side of an environment as seen by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub path: PathBuf,
    pub state: FileState,
}

/// A name discovered in the variables directory, complete or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub variables: CatalogFile,
    pub backend: CatalogFile,
}

impl CatalogEntry {
    pub fn file(&self, kind: FileKind) -> &CatalogFile {
        match kind {
            FileKind::Variables => &self.variables,
            FileKind::Backend => &self.backend,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.variables.state.is_usable() && self.backend.state.is_usable()
    }

    /// The first unusable file, variables side first.
    pub fn first_problem(&self) -> Option<(FileKind, FileProblem)> {
        FileKind::ALL.into_iter().find_map(|kind| match self.file(kind).state {
            FileState::Present { .. } => None,
            FileState::Empty => Some((kind, FileProblem::Empty)),
            FileState::Missing => Some((kind, FileProblem::Missing)),
        })
    }

    pub fn to_definition(&self) -> EnvironmentDefinition {
        EnvironmentDefinition {
            name: self.name.clone(),
            variables_file: self.variables.path.clone(),
            backend_file: self.backend.path.clone(),
        }
    }
}

// --- SETTINGS MODELS ---

/// The recognized settings keys, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    VariablesDirectory,
    ToolExecutablePath,
    DefaultEnvironment,
    AutoApprove,
    Verbose,
}

impl ConfigKey {
    pub const ALL: [Self; 5] = [
        Self::VariablesDirectory,
        Self::ToolExecutablePath,
        Self::DefaultEnvironment,
        Self::AutoApprove,
        Self::Verbose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VariablesDirectory => "variables_directory",
            Self::ToolExecutablePath => "tool_executable_path",
            Self::DefaultEnvironment => "default_environment",
            Self::AutoApprove => "auto_approve",
            Self::Verbose => "verbose",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, Self::AutoApprove | Self::Verbose)
    }

    /// Comma-separated list of every valid key, for error messages.
    pub fn valid_keys() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which settings file an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Project,
}

/// The layer an effective setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Default,
    Global,
    Project,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Global => f.write_str("global"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// The contents of one settings file. Absent fields fall through to the next layer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl SettingsLayer {
    pub fn defines(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::VariablesDirectory => self.variables_directory.is_some(),
            ConfigKey::ToolExecutablePath => self.tool_executable_path.is_some(),
            ConfigKey::DefaultEnvironment => self.default_environment.is_some(),
            ConfigKey::AutoApprove => self.auto_approve.is_some(),
            ConfigKey::Verbose => self.verbose.is_some(),
        }
    }
}

/// The single merged settings object every downstream component receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub variables_directory: PathBuf,
    pub tool_executable_path: String,
    pub default_environment: Option<String>,
    pub auto_approve: bool,
    pub verbose: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            variables_directory: PathBuf::from("vars"),
            tool_executable_path: "terraform".to_string(),
            default_environment: None,
            auto_approve: false,
            verbose: false,
        }
    }
}

impl EffectiveConfig {
    /// Renders one field for display.
    pub fn display_value(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::VariablesDirectory => self.variables_directory.display().to_string(),
            ConfigKey::ToolExecutablePath => self.tool_executable_path.clone(),
            ConfigKey::DefaultEnvironment => self
                .default_environment
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
            ConfigKey::AutoApprove => self.auto_approve.to_string(),
            ConfigKey::Verbose => self.verbose.to_string(),
        }
    }
}

// --- TRANSLATION & EXECUTION MODELS ---

/// A fully built invocation of the wrapped tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedCommand {
    pub executable: String,
    /// Subcommand first, then structural arguments, then the user's arguments.
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub requires_environment: bool,
    /// Extra variables for the child process.
    pub environment: BTreeMap<String, String>,
}

impl TranslatedCommand {
    /// The command line as a user could paste it into a shell.
    pub fn command_line(&self) -> String {
        let parts: Vec<&str> = std::iter::once(self.executable.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect();
        shlex::try_join(parts.iter().copied()).unwrap_or_else(|_| parts.join(" "))
    }
}

impl fmt::Display for TranslatedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// One ranked suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub distance: usize,
}

/// Ranked candidates for a name that was not found, closest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResult {
    pub requested_name: String,
    pub candidates: Vec<Suggestion>,
}

impl SuggestionResult {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn best(&self) -> Option<&Suggestion> {
        self.candidates.first()
    }
}

/// What came back from the wrapped tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
