//! # Command Translator
//!
//! Turns a subcommand name, an optional environment and the user's raw
//! arguments into the exact invocation of the wrapped tool.
//!
//! The rules, in the order they apply:
//! 1. Commands that need an environment fail early without one.
//! 2. The environment's backend or variables file is injected as a flag
//!    (unknown subcommands get the variables file).
//! 3. `apply`/`destroy` get at most one `-auto-approve`.
//! 4. Arguments are laid out as `[subcommand, injections, -auto-approve, raw...]`.
//! 5. The tool runs from the project root.
use crate::{
    constants::{AUTO_APPROVE_FLAG, ENVIRONMENT_ENV_VAR},
    core::{
        catalog::{CatalogError, EnvironmentCatalog},
        paths,
    },
    models::{EffectiveConfig, EnvironmentDefinition, TranslatedCommand},
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref SUBCOMMAND_TOKEN: Regex =
        Regex::new(r"^[a-z][a-z0-9-]*$").expect("subcommand pattern is valid");
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(
        "The '{command}' command requires an environment. Commands that need one: {}",
        ToolCommand::requiring_environment().join(", ")
    )]
    MissingEnvironment { command: String },
    #[error("Unsupported command '{token}': {reason}")]
    UnsupportedCommand { token: String, reason: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Which environment file, if any, a command receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    None,
    BackendConfig,
    VarFile,
}

impl Injection {
    fn render(self, definition: &EnvironmentDefinition, project_root: &Path) -> Option<String> {
        let (flag, file) = match self {
            Self::None => return None,
            Self::BackendConfig => ("-backend-config", &definition.backend_file),
            Self::VarFile => ("-var-file", &definition.variables_file),
        };
        Some(format!(
            "{}={}",
            flag,
            paths::display_relative(file, project_root).display()
        ))
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::BackendConfig => "-backend-config",
            Self::VarFile => "-var-file",
        }
    }
}

/// The subcommands of the wrapped tool that get special treatment, plus a
/// catch-all for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Init,
    Plan,
    Apply,
    Destroy,
    Output,
    Refresh,
    Fmt,
    Validate,
    State,
    Import,
    PassThrough(String),
}

impl ToolCommand {
    pub const KNOWN: [Self; 10] = [
        Self::Init,
        Self::Plan,
        Self::Apply,
        Self::Destroy,
        Self::Output,
        Self::Refresh,
        Self::Fmt,
        Self::Validate,
        Self::State,
        Self::Import,
    ];

    /// Classifies a token. Anything subcommand-shaped that is not known is passed through.
    pub fn parse(token: &str) -> Result<Self, TranslateError> {
        if let Some(known) = Self::KNOWN.into_iter().find(|c| c.name() == token) {
            return Ok(known);
        }
        if SUBCOMMAND_TOKEN.is_match(token) {
            Ok(Self::PassThrough(token.to_string()))
        } else {
            Err(TranslateError::UnsupportedCommand {
                token: token.to_string(),
                reason: "subcommands are lowercase words such as 'plan' or 'force-unlock'"
                    .to_string(),
            })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PassThrough(token) => token,
            known => known.keyword(),
        }
    }

    pub fn requires_environment(&self) -> bool {
        !matches!(self, Self::Fmt | Self::Validate | Self::PassThrough(_))
    }

    /// Unknown subcommands run against an environment get its variables file.
    pub fn injection(&self) -> Injection {
        match self {
            Self::Init => Injection::BackendConfig,
            Self::Plan
            | Self::Apply
            | Self::Destroy
            | Self::Refresh
            | Self::Import
            | Self::PassThrough(_) => Injection::VarFile,
            Self::Output | Self::Fmt | Self::Validate | Self::State => Injection::None,
        }
    }

    pub fn supports_auto_approve(&self) -> bool {
        matches!(self, Self::Apply | Self::Destroy)
    }

    /// Names of the known commands that need an environment.
    pub fn requiring_environment() -> Vec<&'static str> {
        Self::KNOWN
            .iter()
            .filter(|c| c.requires_environment())
            .map(Self::keyword)
            .collect()
    }

    fn keyword(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Output => "output",
            Self::Refresh => "refresh",
            Self::Fmt => "fmt",
            Self::Validate => "validate",
            Self::State => "state",
            Self::Import => "import",
            Self::PassThrough(_) => "",
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value an auto-approve argument sets: `-auto-approve`, `--auto-approve`,
/// or either with `=<bool>`. `None` when `arg` is something else.
fn auto_approve_value(arg: &str) -> Option<bool> {
    let flag = arg.strip_prefix('-')?;
    let flag = flag.strip_prefix('-').unwrap_or(flag);
    let value = match flag.split_once('=') {
        None if flag == "auto-approve" => return Some(true),
        Some(("auto-approve", value)) => value,
        _ => return None,
    };
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn is_auto_approve_flag(arg: &str) -> bool {
    auto_approve_value(arg).is_some()
}

/// Builds invocations of the wrapped tool for one project.
#[derive(Debug)]
pub struct Translator<'a> {
    config: &'a EffectiveConfig,
    catalog: &'a EnvironmentCatalog,
    project_root: PathBuf,
}

impl<'a> Translator<'a> {
    pub fn new(
        config: &'a EffectiveConfig,
        catalog: &'a EnvironmentCatalog,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            catalog,
            project_root: project_root.into(),
        }
    }

    /// Resolves the environment (if any) and builds the full invocation.
    ///
    /// A command that needs an environment fails before the catalog is touched.
    pub fn translate(
        &self,
        command_name: &str,
        environment: Option<&str>,
        raw_args: &[String],
    ) -> Result<TranslatedCommand, TranslateError> {
        let command = ToolCommand::parse(command_name)?;

        let definition = match environment {
            Some(name) => Some(self.catalog.resolve(name)?),
            None if command.requires_environment() => {
                return Err(TranslateError::MissingEnvironment {
                    command: command.name().to_string(),
                });
            }
            None => None,
        };

        let translated = build_invocation(
            &command,
            definition.as_ref(),
            raw_args,
            self.config,
            &self.project_root,
        );
        log::debug!("Translated '{}' into: {:?}", command, translated.arguments);
        Ok(translated)
    }
}

/// Lays out the argument vector for an already-resolved environment.
pub fn build_invocation(
    command: &ToolCommand,
    definition: Option<&EnvironmentDefinition>,
    raw_args: &[String],
    config: &EffectiveConfig,
    project_root: &Path,
) -> TranslatedCommand {
    let mut arguments = vec![command.name().to_string()];

    if let Some(definition) = definition {
        arguments.extend(command.injection().render(definition, project_root));
    }

    // The last flag the user gave wins over the setting.
    let user_choice = raw_args.iter().rev().find_map(|arg| auto_approve_value(arg));
    let absorb_flag = command.supports_auto_approve();
    if absorb_flag && user_choice.unwrap_or(config.auto_approve) {
        arguments.push(AUTO_APPROVE_FLAG.to_string());
    }

    arguments.extend(
        raw_args
            .iter()
            .filter(|arg| !(absorb_flag && is_auto_approve_flag(arg)))
            .cloned(),
    );

    let mut environment = BTreeMap::new();
    if let Some(definition) = definition {
        environment.insert(ENVIRONMENT_ENV_VAR.to_string(), definition.name.clone());
    }

    TranslatedCommand {
        executable: config.tool_executable_path.clone(),
        arguments,
        working_directory: project_root.to_path_buf(),
        requires_environment: command.requires_environment(),
        environment,
    }
}
