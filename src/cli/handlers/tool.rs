//! # Handler for tool subcommands
//!
//! Everything that is not a wrapper command (`plan`, `apply`, `force-unlock`, ...)
//! lands here: the environment is picked out of the arguments, the command is
//! translated, and the wrapped tool runs with the terminal attached.

use anyhow::Result;
use colored::*;

use crate::{
    cli::handlers::commons,
    constants::AUTO_APPROVE_FLAG,
    core::{
        catalog::{CatalogError, EnvironmentCatalog},
        translator::{ToolCommand, Translator},
    },
    models::{EffectiveConfig, TranslatedCommand},
    session::Session,
    system::executor::{self, OutputMode},
};

/// The main handler for `toffee <tool-subcommand> [env] [args...]`.
pub fn handle(command_name: &str, args: Vec<String>, session: &mut Session) -> Result<()> {
    let command = ToolCommand::parse(command_name)?;
    let config = commons::load_config(session)?;
    let catalog = session.catalog(&config);

    let (environment, raw_args) = split_environment(
        &command,
        args,
        &catalog,
        config.default_environment.as_deref(),
    )?;

    execute_tool_command(
        session,
        &config,
        &catalog,
        command.name(),
        environment.as_deref(),
        &raw_args,
    )
}

/// Picks the environment out of the arguments.
///
/// Commands that need one take the first positional argument, falling back to
/// `default_environment` when the arguments start with a flag or are empty.
/// Commands where it is optional only take the first argument when it names a
/// complete environment; anything else stays a tool argument.
pub fn split_environment(
    command: &ToolCommand,
    args: Vec<String>,
    catalog: &EnvironmentCatalog,
    default_environment: Option<&str>,
) -> Result<(Option<String>, Vec<String>), CatalogError> {
    let first_is_positional = args.first().is_some_and(|arg| !arg.starts_with('-'));

    if command.requires_environment() {
        if first_is_positional {
            let mut args = args.into_iter();
            let environment = args.next();
            return Ok((environment, args.collect()));
        }
        if let Some(default) = default_environment {
            log::debug!("No environment given, using default '{}'", default);
        }
        return Ok((default_environment.map(str::to_string), args));
    }

    let names_environment = match args.first() {
        Some(first) if first_is_positional => catalog
            .list()?
            .iter()
            .any(|entry| &entry.name == first && entry.is_complete()),
        _ => false,
    };
    if names_environment {
        let mut args = args.into_iter();
        let environment = args.next();
        Ok((environment, args.collect()))
    } else {
        Ok((None, args))
    }
}

/// Translates and runs one tool command, reporting the outcome on stderr.
pub fn execute_tool_command(
    session: &Session,
    config: &EffectiveConfig,
    catalog: &EnvironmentCatalog,
    command_name: &str,
    environment: Option<&str>,
    raw_args: &[String],
) -> Result<()> {
    let translator = Translator::new(config, catalog, session.project_root());
    let translated = translator.translate(command_name, environment, raw_args)?;

    if config.verbose {
        eprintln!(
            "  {:<22} {}",
            t!("verbose.label.variables_directory"),
            commons::display_path(session, catalog.directory())
        );
        if let Some(name) = environment {
            eprintln!("  {:<22} {}", t!("verbose.label.environment"), name);
        }
    }

    if !confirm_destroy(&translated, environment)? {
        eprintln!("{}", t!("tool.info.aborted").yellow());
        return Ok(());
    }

    eprintln!(
        "{} {}",
        t!("tool.label.running").bold(),
        translated.command_line().cyan()
    );

    let result = executor::execute(&translated, session.runner(), OutputMode::Inherit)?;
    match executor::ensure_success(&translated, &result) {
        Ok(()) => {
            eprintln!(
                "{} {}",
                t!("common.success"),
                format!(t!("tool.success.completed"), command = command_name).green()
            );
            Ok(())
        }
        Err(e) => {
            if result.exit_code != crate::constants::INTERRUPTED_EXIT_CODE {
                eprintln!(
                    "{} {}",
                    t!("common.failure"),
                    format!(
                        t!("tool.error.failed"),
                        command = command_name,
                        code = result.exit_code
                    )
                    .red()
                );
            }
            Err(e.into())
        }
    }
}

/// An auto-approved destroy gets one last chance to back out when someone is at the terminal.
fn confirm_destroy(translated: &TranslatedCommand, environment: Option<&str>) -> Result<bool> {
    let is_destroy = translated
        .arguments
        .first()
        .is_some_and(|sub| sub == ToolCommand::Destroy.name());
    let auto_approved = translated
        .arguments
        .iter()
        .any(|arg| arg == AUTO_APPROVE_FLAG);
    if !is_destroy || !auto_approved || !commons::is_interactive() {
        return Ok(true);
    }

    eprintln!(
        "{} {}",
        t!("common.warning").red().bold(),
        format!(
            t!("tool.warning.destroy"),
            environment = environment.unwrap_or("-")
        )
    );
    commons::confirm(t!("tool.prompt.destroy"), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::SettingsStore;
    use crate::models::ExecutionResult;
    use crate::system::executor::{ExecutionError, ProcessRunner};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct RecordingRunner {
        calls: Rc<RefCell<Vec<TranslatedCommand>>>,
        exit_code: i32,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(
            &self,
            command: &TranslatedCommand,
            _mode: OutputMode,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.calls.borrow_mut().push(command.clone());
            Ok(ExecutionResult {
                exit_code: self.exit_code,
                ..Default::default()
            })
        }
    }

    struct Fixture {
        temp: TempDir,
        calls: Rc<RefCell<Vec<TranslatedCommand>>>,
        session: Session,
    }

    fn fixture(project_settings: &str, exit_code: i32) -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("infra");
        let vars = root.join("vars");
        fs::create_dir_all(&vars).unwrap();
        for env in ["dev", "prod"] {
            fs::write(vars.join(format!("{env}.tfvars")), "a = 1").unwrap();
            fs::write(vars.join(format!("{env}.tfbackend")), "key = \"k\"").unwrap();
        }
        fs::write(root.join(".toffee.toml"), project_settings).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = RecordingRunner {
            calls: Rc::clone(&calls),
            exit_code,
        };
        let store = SettingsStore::new(temp.path().join("global.toml"), root.clone());
        let session = Session::with_store(root, store).with_runner(Box::new(runner));
        Fixture {
            temp,
            calls,
            session,
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_runs_with_var_file() {
        let mut fx = fixture("", 0);
        handle("plan", args(&["dev", "-out=dev.plan"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].arguments,
            args(&["plan", "-var-file=vars/dev.tfvars", "-out=dev.plan"])
        );
        assert_eq!(calls[0].working_directory, fx.temp.path().join("infra"));
    }

    #[test]
    fn test_default_environment_fills_in() {
        let mut fx = fixture("default_environment = \"prod\"\n", 0);
        handle("apply", args(&["-lock=false"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(
            calls[0].arguments,
            args(&["apply", "-var-file=vars/prod.tfvars", "-lock=false"])
        );
    }

    #[test]
    fn test_missing_environment_spawns_nothing() {
        let mut fx = fixture("", 0);
        let err = handle("destroy", vec![], &mut fx.session).unwrap_err();
        assert!(err.downcast_ref::<crate::core::translator::TranslateError>().is_some());
        assert!(fx.calls.borrow().is_empty());
    }

    #[test]
    fn test_unknown_environment_spawns_nothing() {
        let mut fx = fixture("", 0);
        assert!(handle("plan", args(&["pro"]), &mut fx.session).is_err());
        assert!(fx.calls.borrow().is_empty());
    }

    #[test]
    fn test_validate_takes_environment_only_when_known() {
        let mut fx = fixture("", 0);
        handle("validate", args(&["dev"]), &mut fx.session).unwrap();
        handle("validate", args(&["-json"]), &mut fx.session).unwrap();
        handle("fmt", args(&["modules"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(calls[0].arguments, args(&["validate"]));
        assert_eq!(calls[0].environment.len(), 1);
        assert_eq!(calls[1].arguments, args(&["validate", "-json"]));
        assert!(calls[1].environment.is_empty());
        assert_eq!(calls[2].arguments, args(&["fmt", "modules"]));
    }

    #[test]
    fn test_optional_environment_ignores_incomplete_entries() {
        let mut fx = fixture("", 0);
        let vars = fx.temp.path().join("infra").join("vars");
        fs::write(vars.join("qa.tfvars"), "a = 1").unwrap();

        handle("fmt", args(&["qa"]), &mut fx.session).unwrap();
        handle("validate", args(&["qa", "-json"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(calls[0].arguments, args(&["fmt", "qa"]));
        assert!(calls[0].environment.is_empty());
        assert_eq!(calls[1].arguments, args(&["validate", "qa", "-json"]));
    }

    #[test]
    fn test_pass_through_with_known_environment_gets_var_file() {
        let mut fx = fixture("", 0);
        handle("console", args(&["dev"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(
            calls[0].arguments,
            args(&["console", "-var-file=vars/dev.tfvars"])
        );
    }

    #[test]
    fn test_tool_exit_code_is_propagated() {
        let mut fx = fixture("", 3);
        let err = handle("plan", args(&["dev"]), &mut fx.session).unwrap_err();
        assert_eq!(commons::report_failure(&err), 3);
    }

    #[test]
    fn test_auto_approve_from_settings() {
        let mut fx = fixture("auto_approve = true\n", 0);
        handle("apply", args(&["dev", "-auto-approve"]), &mut fx.session).unwrap();

        let calls = fx.calls.borrow();
        assert_eq!(
            calls[0].arguments,
            args(&["apply", "-var-file=vars/dev.tfvars", "-auto-approve"])
        );
    }

    #[test]
    fn test_split_environment_for_required_command() {
        let temp = TempDir::new().unwrap();
        let catalog = EnvironmentCatalog::new(temp.path());

        let (env, rest) =
            split_environment(&ToolCommand::State, args(&["dev", "list"]), &catalog, None).unwrap();
        assert_eq!(env.as_deref(), Some("dev"));
        assert_eq!(rest, args(&["list"]));

        let (env, rest) =
            split_environment(&ToolCommand::Plan, args(&["-refresh=false"]), &catalog, Some("qa"))
                .unwrap();
        assert_eq!(env.as_deref(), Some("qa"));
        assert_eq!(rest, args(&["-refresh=false"]));

        let (env, _) = split_environment(&ToolCommand::Plan, vec![], &catalog, None).unwrap();
        assert_eq!(env, None);
    }
}
