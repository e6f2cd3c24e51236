// src/cli/handlers/info.rs

use crate::{
    cli::{
        args::{InfoArgs, InfoCommand},
        dispatcher,
        handlers::commons,
    },
    core::{catalog::EnvironmentCatalog, translator::ToolCommand},
    models::{CatalogEntry, CatalogFile, FileKind, FileState},
    session::Session,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use colored::*;
use dialoguer::console::measure_text_width;
use std::fs;

/// The main handler for the `info` command.
pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let info_args = InfoArgs::try_parse_from(&args)?;

    match info_args.command.unwrap_or(InfoCommand::Envs) {
        InfoCommand::Envs => {
            let config = commons::load_config(session)?;
            list_environments(session, &session.catalog(&config))
        }
        InfoCommand::Env { name } => {
            let config = commons::load_config(session)?;
            show_environment(session, &session.catalog(&config), &name)
        }
        InfoCommand::Commands => {
            list_commands();
            Ok(())
        }
    }
}

// --- Subcommand Logic ---

/// Prints every environment with the state of both of its files.
fn list_environments(session: &Session, catalog: &EnvironmentCatalog) -> Result<()> {
    let entries = catalog.list()?;
    let directory = commons::display_path(session, catalog.directory());

    if entries.is_empty() {
        println!(
            "\n{}",
            format!(t!("info.envs.none"), directory = directory).dimmed()
        );
        return Ok(());
    }

    println!(
        "\n--- {} ({}) ---",
        t!("info.envs.header").yellow(),
        directory
    );

    let name_width = entries
        .iter()
        .map(|e| measure_text_width(&e.name))
        .max()
        .unwrap_or(0)
        .max(measure_text_width(t!("info.envs.column.name")));

    println!(
        "  {:<name_width$}  {:<10}  {:<10}  {}",
        t!("info.envs.column.name").blue(),
        t!("info.envs.column.variables").blue(),
        t!("info.envs.column.backend").blue(),
        t!("info.envs.column.status").blue(),
    );
    for entry in &entries {
        println!(
            "  {:<name_width$}  {:<10}  {:<10}  {}",
            entry.name.cyan(),
            state_label(&entry.variables.state),
            state_label(&entry.backend.state),
            status_label(entry)
        );
    }
    Ok(())
}

/// Prints paths, metadata and contents of one environment's files.
fn show_environment(session: &Session, catalog: &EnvironmentCatalog, name: &str) -> Result<()> {
    let description = catalog.describe(name)?;

    println!(
        "\n--- {} '{}' ---",
        t!("info.env.header"),
        description.name().yellow()
    );
    println!(
        "  {:<12} {}",
        t!("info.envs.column.status").blue(),
        status_label(&description.entry)
    );

    for (kind, file) in description.files() {
        print_file_metadata(session, kind, file);
    }

    for (kind, file) in description.files() {
        if !file.state.is_usable() {
            continue;
        }
        let contents = fs::read_to_string(&file.path)
            .with_context(|| format!("Failed to read '{}'", file.path.display()))?;
        println!(
            "\n  {}",
            format!(
                t!("info.env.contents"),
                file = commons::display_path(session, &file.path)
            )
            .blue()
        );
        for line in contents.lines() {
            println!("    {}", line.dimmed());
        }
        log::debug!("Printed {} file of '{}'", kind, name);
    }
    Ok(())
}

fn print_file_metadata(session: &Session, kind: FileKind, file: &CatalogFile) {
    let label = match kind {
        FileKind::Variables => t!("info.env.label.variables"),
        FileKind::Backend => t!("info.env.label.backend"),
    };
    println!(
        "  {:<12} {}",
        label.blue(),
        commons::display_path(session, &file.path)
    );

    match &file.state {
        FileState::Present { size, modified } => {
            let modified = modified
                .map(|time| {
                    DateTime::<Local>::from(time)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<12} {}",
                "",
                format!(t!("info.env.metadata"), size = size, modified = modified).dimmed()
            );
        }
        state => println!("  {:<12} {}", "", state_label(state)),
    }
}

/// Prints the tool commands with the way each is translated, then the wrapper commands.
fn list_commands() {
    println!("\n--- {} ---", t!("info.commands.header").yellow());
    println!(
        "  {:<10}  {:<12}  {:<16}  {}",
        t!("info.commands.column.command").blue(),
        t!("info.commands.column.environment").blue(),
        t!("info.commands.column.injects").blue(),
        t!("info.commands.column.auto_approve").blue(),
    );
    for command in ToolCommand::KNOWN.iter() {
        let environment = if command.requires_environment() {
            t!("info.commands.required")
        } else {
            t!("info.commands.optional")
        };
        let auto_approve = if command.supports_auto_approve() {
            t!("common.yes")
        } else {
            "-"
        };
        println!(
            "  {:<10}  {:<12}  {:<16}  {}",
            command.name().cyan(),
            environment,
            command.injection().describe(),
            auto_approve
        );
    }
    println!("\n  {}", t!("info.commands.pass_through").dimmed());

    let wrappers: Vec<&str> = dispatcher::wrapper_commands().collect();
    println!(
        "\n  {} {}",
        t!("info.commands.wrappers").blue(),
        wrappers.join(", ")
    );
}

// --- Display Helpers ---

fn state_label(state: &FileState) -> ColoredString {
    match state {
        FileState::Present { .. } => t!("info.state.present").green(),
        FileState::Empty => t!("info.state.empty").yellow(),
        FileState::Missing => t!("info.state.missing").red(),
    }
}

fn status_label(entry: &CatalogEntry) -> ColoredString {
    if entry.is_complete() {
        t!("info.status.complete").green()
    } else {
        t!("info.status.incomplete").red().bold()
    }
}
