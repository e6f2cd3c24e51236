//! # Handler for the `config` command
//!
//! - `config show` prints every effective setting next to the layer it came from.
//! - `config set <key> <value> [--project]` changes one key in one file.
//! - `config init [--force]` writes a starter `.toffee.toml`.
//!
//! `set` and `init` never load the merged settings, so they still work when a
//! settings file is malformed and needs fixing.

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::{
        args::{ConfigArgs, ConfigCommand},
        handlers::commons,
    },
    core::settings::SettingsError,
    models::{ConfigKey, Scope, SettingSource},
    session::Session,
};

// --- Main Handler ---

/// The main handler for the `config` command. Defaults to `show`.
pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let config_args = ConfigArgs::try_parse_from(&args)?;

    match config_args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => show_config(session),
        ConfigCommand::Set {
            key,
            value,
            project,
        } => {
            let scope = if project { Scope::Project } else { Scope::Global };
            set_config(session, &key, &value, scope)
        }
        ConfigCommand::Init { force } => init_config(session, force),
    }
}

// --- Subcommand Logic ---

fn show_config(session: &mut Session) -> Result<()> {
    let project_root = session.project_root().to_path_buf();
    let loaded = session.settings()?;

    println!("\n--- {} ---", t!("config.show.header").yellow());
    println!(
        "  {:<22} {:<30} {}",
        t!("config.show.column.setting").blue(),
        t!("config.show.column.value").blue(),
        t!("config.show.column.source").blue()
    );
    for key in ConfigKey::ALL {
        let source = loaded.source(key);
        let source_label = match source {
            SettingSource::Default => source.to_string().dimmed(),
            SettingSource::Global => source.to_string().yellow(),
            SettingSource::Project => source.to_string().green(),
        };
        println!(
            "  {:<22} {:<30} {}",
            key.as_str().cyan(),
            loaded.config.display_value(key),
            source_label
        );
    }

    println!();
    for (label, layer) in [
        (t!("config.show.label.global"), &loaded.global),
        (t!("config.show.label.project"), &loaded.project),
    ] {
        let status = if layer.present {
            t!("verbose.status.loaded")
        } else {
            t!("verbose.status.absent")
        };
        println!(
            "  {:<22} {} {}",
            label,
            layer.path.display(),
            status.dimmed()
        );
    }
    println!("  {:<22} {}", t!("verbose.label.project_root"), project_root.display());

    for warning in &loaded.warnings {
        eprintln!("{} {}", t!("common.warning").yellow().bold(), warning);
    }
    Ok(())
}

fn set_config(session: &Session, key: &str, value: &str, scope: Scope) -> Result<()> {
    let path = session.store().set_value(key, value, scope)?;
    println!(
        "{} {}",
        t!("common.success"),
        format!(
            t!("config.set.success"),
            key = key.cyan(),
            value = value.trim().bold(),
            file = path.display()
        )
    );
    Ok(())
}

fn init_config(session: &Session, force: bool) -> Result<()> {
    let store = session.store();
    let path = store.project_path();

    let overwrite = if force || !path.exists() {
        force
    } else {
        println!(
            "{}",
            format!(t!("config.init.exists"), file = path.display()).yellow()
        );
        if !commons::is_interactive() {
            return Err(SettingsError::AlreadyExists { path }.into());
        }
        if !commons::confirm(t!("config.init.prompt_overwrite"), false)? {
            println!("{}", t!("common.aborted"));
            return Ok(());
        }
        true
    };

    let written = store.init_project(overwrite)?;
    println!(
        "{} {}",
        t!("common.success"),
        format!(t!("config.init.success"), file = written.display())
    );
    Ok(())
}
