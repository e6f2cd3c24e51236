// src/system/executor.rs

use crate::constants::INTERRUPTED_EXIT_CODE;
use crate::models::{ExecutionResult, TranslatedCommand};
use std::fmt;
use std::io::ErrorKind;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Could not start '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Executable '{executable}' was not found. Check 'tool_executable_path' in your settings.")]
    NotFound { executable: String },
    #[error("Command '{command}' exited with code {code}.")]
    NonZeroExit { command: String, code: i32 },
    #[error("Command '{command}' was interrupted.")]
    Interrupted { command: String },
    #[error("Lost track of '{executable}' while waiting for it: {source}")]
    Wait {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    /// The process exit code this error should end the program with, if it carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            Self::Interrupted { .. } => Some(INTERRUPTED_EXIT_CODE),
            _ => None,
        }
    }
}

/// Where the child's standard streams go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream straight to the user's terminal.
    Inherit,
    /// Collect stdout and stderr into the result.
    Capture,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("inherit"),
            Self::Capture => f.write_str("capture"),
        }
    }
}

/// Something that can run a translated command and report how it went.
pub trait ProcessRunner: fmt::Debug {
    fn run(
        &self,
        command: &TranslatedCommand,
        mode: OutputMode,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        command: &TranslatedCommand,
        mode: OutputMode,
    ) -> Result<ExecutionResult, ExecutionError> {
        let clean_cwd = dunce::simplified(&command.working_directory);
        log::debug!(
            "Spawning {:?} with {:?} in {} ({})",
            command.executable,
            command.arguments,
            clean_cwd.display(),
            mode
        );

        let mut process = StdCommand::new(&command.executable);
        process
            .args(&command.arguments)
            .current_dir(clean_cwd)
            .envs(&command.environment);

        let spawn_error = |e: std::io::Error| {
            if e.kind() == ErrorKind::NotFound {
                ExecutionError::NotFound {
                    executable: command.executable.clone(),
                }
            } else {
                ExecutionError::Spawn {
                    executable: command.executable.clone(),
                    source: e,
                }
            }
        };

        match mode {
            OutputMode::Inherit => {
                let status = process
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .map_err(spawn_error)?
                    .wait()
                    .map_err(|e| ExecutionError::Wait {
                        executable: command.executable.clone(),
                        source: e,
                    })?;
                Ok(ExecutionResult {
                    exit_code: exit_code_of(status),
                    ..Default::default()
                })
            }
            OutputMode::Capture => {
                let output = process
                    .stdin(Stdio::null())
                    .output()
                    .map_err(spawn_error)?;
                Ok(ExecutionResult {
                    exit_code: exit_code_of(output.status),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }
}

/// Runs `command` through `runner`, adding nothing of its own.
///
/// The child's exit code comes back unchanged, including non-zero codes; turning
/// those into errors is up to the caller.
pub fn execute(
    command: &TranslatedCommand,
    runner: &dyn ProcessRunner,
    mode: OutputMode,
) -> Result<ExecutionResult, ExecutionError> {
    let result = runner.run(command, mode)?;
    log::debug!("'{}' finished with code {}", command, result.exit_code);
    Ok(result)
}

/// Turns a finished run into an error when the tool failed.
pub fn ensure_success(
    command: &TranslatedCommand,
    result: &ExecutionResult,
) -> Result<(), ExecutionError> {
    match result.exit_code {
        0 => Ok(()),
        INTERRUPTED_EXIT_CODE => Err(ExecutionError::Interrupted {
            command: command.command_line(),
        }),
        code => Err(ExecutionError::NonZeroExit {
            command: command.command_line(),
            code,
        }),
    }
}

/// A signal death is reported the way shells do: `128 + signal`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn command(executable: &str, args: &[&str]) -> TranslatedCommand {
        TranslatedCommand {
            executable: executable.to_string(),
            arguments: args.iter().map(|s| s.to_string()).collect(),
            working_directory: std::env::temp_dir(),
            requires_environment: false,
            environment: BTreeMap::new(),
        }
    }

    #[test]
    fn test_missing_executable_is_not_found() {
        let cmd = command("toffee-test-no-such-binary", &["plan"]);
        let err = execute(&cmd, &SystemRunner, OutputMode::Capture).unwrap_err();
        assert!(matches!(err, ExecutionError::NotFound { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_ensure_success_maps_codes() {
        let cmd = command("terraform", &["apply"]);
        let ok = ExecutionResult::default();
        assert!(ensure_success(&cmd, &ok).is_ok());

        let failed = ExecutionResult {
            exit_code: 3,
            ..Default::default()
        };
        let err = ensure_success(&cmd, &failed).unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert!(err.to_string().contains("terraform apply"));

        let interrupted = ExecutionResult {
            exit_code: 130,
            ..Default::default()
        };
        assert!(matches!(
            ensure_success(&cmd, &interrupted),
            Err(ExecutionError::Interrupted { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_propagates_exit_code_and_output() {
        let mut cmd = command("sh", &["-c", "echo \"$TOFFEE_ENVIRONMENT\"; echo oops >&2; exit 7"]);
        cmd.environment
            .insert("TOFFEE_ENVIRONMENT".to_string(), "dev".to_string());

        let result = execute(&cmd, &SystemRunner, OutputMode::Capture).unwrap();
        assert_eq!(result.exit_code, 7);
        assert_eq!(result.stdout, "dev\n");
        assert_eq!(result.stderr, "oops\n");
        assert!(!result.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_working_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut cmd = command("sh", &["-c", "pwd"]);
        cmd.working_directory = PathBuf::from(temp.path());

        let result = execute(&cmd, &SystemRunner, OutputMode::Capture).unwrap();
        let reported = PathBuf::from(result.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_maps_to_128_plus_signal() {
        let cmd = command("sh", &["-c", "kill -TERM $$"]);
        let result = execute(&cmd, &SystemRunner, OutputMode::Capture).unwrap();
        assert_eq!(result.exit_code, 128 + 15);
    }
}
