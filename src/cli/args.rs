// src/cli/args.rs
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, trailing_var_arg = true)]
pub struct RunArgs {
    /// The environment to run against.
    pub environment: Option<String>,

    /// The tool subcommand, passed through as-is (e.g. `force-unlock`).
    pub subcommand: Option<String>,

    /// Arguments for the tool, forwarded untouched.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Create or copy environments.")]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Creates template `.tfvars` / `.tfbackend` files for a new environment.
    Create {
        /// The environment name (e.g. 'staging').
        name: String,
    },
    /// Copies an existing environment under a new name.
    #[command(name = "copy", aliases = ["cp"])]
    Copy {
        /// The environment to copy from.
        source: String,
        /// The name of the new environment.
        target: String,
        /// Overwrite the target's files if they already exist.
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Show or change settings.")]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Shows every effective setting and where it came from.
    Show,
    /// Sets one key in the global settings file (or the project file with `--project`).
    Set {
        /// The settings key (e.g. 'auto_approve').
        key: String,
        /// The new value.
        value: String,
        /// Write to the project's `.toffee.toml` instead of the global file.
        #[arg(long, short)]
        project: bool,
    },
    /// Writes a starter `.toffee.toml` in the project root.
    Init {
        /// Overwrite an existing file without asking.
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Inspect environments and commands.")]
pub struct InfoArgs {
    #[command(subcommand)]
    pub command: Option<InfoCommand>,
}

#[derive(Subcommand, Debug)]
pub enum InfoCommand {
    /// Lists every environment with the state of its files.
    #[command(name = "envs", aliases = ["ls"])]
    Envs,
    /// Shows the files of one environment.
    Env {
        /// The environment name.
        name: String,
    },
    /// Lists the tool commands and how each one is translated.
    Commands,
}
