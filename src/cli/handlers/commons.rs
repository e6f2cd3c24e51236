// src/cli/handlers/commons.rs

// Shared functions used by several handlers and by the binary's error reporting.

use anyhow::Result;
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::io::{ErrorKind, IsTerminal};

use crate::{
    constants::{INTERRUPTED_EXIT_CODE, WRAPPER_FAILURE_EXIT_CODE},
    core::{
        catalog::CatalogError,
        paths,
        settings::LoadedSettings,
        suggest,
        translator::{ToolCommand, TranslateError},
    },
    models::{ConfigKey, EffectiveConfig},
    session::Session,
    system::executor::ExecutionError,
};

// --- Settings ---

/// Loads the session's settings, surfacing warnings and the verbose summary.
pub fn load_config(session: &mut Session) -> Result<EffectiveConfig> {
    let project_root = session.project_root().to_path_buf();
    let loaded = session.settings()?;

    for warning in &loaded.warnings {
        eprintln!("{} {}", t!("common.warning").yellow().bold(), warning);
    }
    if loaded.config.verbose {
        print_settings_summary(loaded, &project_root);
    }
    Ok(loaded.config.clone())
}

/// Prints where the settings came from. Goes to stderr so tool output stays clean.
fn print_settings_summary(loaded: &LoadedSettings, project_root: &std::path::Path) {
    eprintln!("{}", t!("verbose.header").dimmed());
    eprintln!(
        "  {:<22} {}",
        t!("verbose.label.project_root"),
        project_root.display()
    );
    for layer in [&loaded.global, &loaded.project] {
        let status = if layer.present {
            t!("verbose.status.loaded")
        } else {
            t!("verbose.status.absent")
        };
        eprintln!(
            "  {:<22} {} {}",
            t!("verbose.label.settings_file"),
            layer.path.display(),
            status.dimmed()
        );
    }
    for key in ConfigKey::ALL {
        eprintln!(
            "  {:<22} {} {}",
            key.as_str(),
            loaded.config.display_value(key),
            format!("({})", loaded.source(key)).dimmed()
        );
    }
}

// --- Prompts ---

/// True when a person can answer prompts.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Asks a yes/no question. Without a terminal the default answer is used.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    if !is_interactive() {
        log::debug!("Not interactive, answering '{}' with {}", prompt, default);
        return Ok(default);
    }
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    Ok(answer)
}

// --- Error Reporting ---

/// Prints `error` for the user and returns the exit code the process should end with.
///
/// A failed tool run ends with the tool's own code and no extra noise. Everything
/// else is a wrapper failure.
pub fn report_failure(error: &anyhow::Error) -> i32 {
    if let Some(code) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ExecutionError>())
        .and_then(ExecutionError::exit_code)
    {
        return code;
    }

    if is_prompt_interrupt(error) {
        return INTERRUPTED_EXIT_CODE;
    }

    if let Some(clap_error) = error.downcast_ref::<clap::Error>() {
        // Help and version requests also arrive here.
        let _ = clap_error.print();
        return if clap_error.use_stderr() {
            WRAPPER_FAILURE_EXIT_CODE
        } else {
            0
        };
    }

    eprintln!("\n{}: {}", "Error".red().bold(), error);

    if let Some(CatalogError::EnvironmentNotFound { name, known, .. }) = find_catalog_error(error) {
        print_suggestions(name, known);
    }

    if let Some(TranslateError::MissingEnvironment { command }) =
        error.downcast_ref::<TranslateError>()
    {
        eprintln!(
            "{}",
            format!(t!("error.hint.missing_environment"), command = command).dimmed()
        );
    }

    WRAPPER_FAILURE_EXIT_CODE
}

/// Finds a catalog error, including one carried inside a translation error.
fn find_catalog_error(error: &anyhow::Error) -> Option<&CatalogError> {
    error.chain().find_map(|cause| {
        cause.downcast_ref::<CatalogError>().or_else(|| {
            match cause.downcast_ref::<TranslateError>() {
                Some(TranslateError::Catalog(inner)) => Some(inner),
                _ => None,
            }
        })
    })
}

fn is_prompt_interrupt(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<dialoguer::Error>(),
            Some(dialoguer::Error::IO(e)) if e.kind() == ErrorKind::Interrupted
        )
    })
}

/// Prints ranked "did you mean" candidates, or the known names when none is close.
fn print_suggestions(requested: &str, known: &[String]) {
    let result = suggest::suggest(requested, known);
    if let Some(best) = result.best() {
        eprintln!(
            "\n{} {}",
            t!("suggest.did_you_mean"),
            best.name.cyan().bold()
        );
        for other in result.candidates.iter().skip(1) {
            eprintln!("  {} {}", "-".dimmed(), other.name.cyan());
        }
    } else if known.is_empty() {
        eprintln!("\n{}", t!("suggest.no_environments").dimmed());
    } else {
        eprintln!(
            "\n{} {}",
            t!("suggest.available").dimmed(),
            known.join(", ")
        );
    }
}

// --- Display Helpers ---

/// The project-relative form of `path`, for messages.
pub fn display_path(session: &Session, path: &std::path::Path) -> String {
    paths::display_relative(path, session.project_root())
        .display()
        .to_string()
}

/// The tool commands that need an environment, for usage messages.
pub fn commands_requiring_environment() -> String {
    ToolCommand::requiring_environment().join(", ")
}
