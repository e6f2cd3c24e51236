use crate::{
    cli::{args::RunArgs, handlers::{commons, tool}},
    core::translator::TranslateError,
    session::Session,
};
use anyhow::Result;
use clap::Parser;

///
/// Main entry point for `toffee run <env> <subcommand> [args...]`.
/// Every piece is explicit: no default environment, no guessing.
///
pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;

    let Some(environment) = run_args.environment else {
        return Err(missing_piece(t!("run.error.missing_environment")).into());
    };
    let Some(subcommand) = run_args.subcommand else {
        return Err(missing_piece(t!("run.error.missing_subcommand")).into());
    };

    let config = commons::load_config(session)?;
    let catalog = session.catalog(&config);
    tool::execute_tool_command(
        session,
        &config,
        &catalog,
        &subcommand,
        Some(&environment),
        &run_args.args,
    )
}

fn missing_piece(reason: &str) -> TranslateError {
    TranslateError::UnsupportedCommand {
        token: "run".to_string(),
        reason: reason.to_string(),
    }
}
