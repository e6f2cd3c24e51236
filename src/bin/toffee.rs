// src/bin/toffee.rs

use anyhow::Result;
use clap::Parser;
use toffee::{
    cli::{Cli, dispatcher, handlers::commons},
    session::Session,
};

/// The main entry point of `toffee`.
/// Sets up logging, parses arguments, dispatches, and turns any error into an exit code.
fn main() {
    env_logger::init();

    // --- Centralized Error Handling ---
    if let Err(e) = run_cli(Cli::parse()) {
        std::process::exit(commons::report_failure(&e));
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let cwd = std::env::current_dir()?;
    let mut session = Session::open(&cwd)?;
    log::debug!("Project root: {}", session.project_root().display());

    dispatcher::dispatch(cli.args, &mut session)
}
