use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::{
        args::{EnvArgs, EnvCommand},
        handlers::commons,
    },
    core::catalog::{CatalogError, EnvironmentCatalog},
    session::Session,
};

/// The main handler for the `env` command.
pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let env_args = EnvArgs::try_parse_from(&args)?;
    let config = commons::load_config(session)?;
    let catalog = session.catalog(&config);

    match env_args.command {
        EnvCommand::Create { name } => create_environment(session, &catalog, &name),
        EnvCommand::Copy {
            source,
            target,
            force,
        } => copy_environment(session, &catalog, &source, &target, force),
    }
}

fn create_environment(session: &Session, catalog: &EnvironmentCatalog, name: &str) -> Result<()> {
    let written = catalog.create(name)?;

    println!(
        "{} {}",
        t!("common.success"),
        format!(t!("env.create.success"), name = name.cyan())
    );
    for path in &written {
        println!("  - {}", commons::display_path(session, path));
    }

    let definition = catalog.resolve(name)?;
    println!("\n{}", t!("env.create.next_steps").bold());
    println!(
        "  1. {}",
        format!(
            t!("env.create.step_edit"),
            file = commons::display_path(session, &definition.variables_file).cyan()
        )
    );
    println!(
        "  2. {}",
        format!(
            t!("env.create.step_edit"),
            file = commons::display_path(session, &definition.backend_file).cyan()
        )
    );
    println!(
        "  3. {}",
        format!(t!("env.create.step_init"), name = name).cyan()
    );
    Ok(())
}

fn copy_environment(
    session: &Session,
    catalog: &EnvironmentCatalog,
    source: &str,
    target: &str,
    force: bool,
) -> Result<()> {
    // Fail on a bad source before asking anything about the target.
    catalog.resolve(source)?;

    let exists = target_exists(catalog, target)?;
    if exists && !force {
        if !commons::is_interactive() {
            return Err(CatalogError::AlreadyExists {
                name: target.to_string(),
            }
            .into());
        }
        println!("{}", format!(t!("env.copy.exists"), name = target).yellow());
        if !commons::confirm(t!("env.copy.prompt_overwrite"), false)? {
            println!("{}", t!("common.aborted"));
            return Ok(());
        }
    }

    let definition = catalog.copy(source, target, exists)?;
    println!(
        "{} {}",
        t!("common.success"),
        format!(
            t!("env.copy.success"),
            source = source.cyan(),
            target = target.cyan()
        )
    );
    println!("  - {}", commons::display_path(session, &definition.variables_file));
    println!("  - {}", commons::display_path(session, &definition.backend_file));
    Ok(())
}

fn target_exists(catalog: &EnvironmentCatalog, target: &str) -> Result<bool> {
    match catalog.describe(target) {
        Ok(_) => Ok(true),
        Err(CatalogError::EnvironmentNotFound { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
