use anyhow::Result;

use crate::{cli::handlers, session::Session};

// --- Command Definition and Registry ---

/// A wrapper-level command, its aliases and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &mut Session) -> Result<()>,
}

/// Commands handled by toffee itself. Any other first argument is a tool subcommand.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "config",
        aliases: &["cfg"],
        handler: handlers::config::handle,
    },
    CommandDefinition {
        name: "env",
        aliases: &[],
        handler: handlers::env::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &[],
        handler: handlers::info::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Names of the wrapper commands, for help and `info commands`.
pub fn wrapper_commands() -> impl Iterator<Item = &'static str> {
    COMMAND_REGISTRY.iter().map(|cmd| cmd.name)
}

/// Routes the raw arguments to a wrapper handler, or to the tool handler.
///
/// `toffee <wrapper-command> [args...]` goes to the registry;
/// `toffee <tool-subcommand> [env] [args...]` goes to the tool handler.
pub fn dispatch(all_args: Vec<String>, session: &mut Session) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(first) = args.next() else {
        print!("{}", crate::cli::render_help());
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match find_command(&first) {
        Some(command) => (command.handler)(rest, session),
        None => handlers::tool::handle(&first, rest, session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(find_command("cfg").map(|c| c.name), Some("config"));
        assert_eq!(find_command("run").map(|c| c.name), Some("run"));
        assert!(find_command("plan").is_none());
        assert!(find_command("apply").is_none());
    }

    #[test]
    fn test_wrapper_commands_do_not_shadow_tool_commands() {
        use crate::core::translator::ToolCommand;
        for name in wrapper_commands() {
            assert!(!ToolCommand::KNOWN.iter().any(|c| c.name() == name));
        }
    }
}
