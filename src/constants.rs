// src/constants.rs

/// The name of the project-local settings file, looked up at the project root.
pub const PROJECT_SETTINGS_FILENAME: &str = ".toffee.toml";

/// The directory (inside the user's config dir) holding the global settings file.
pub const GLOBAL_SETTINGS_DIR: &str = "toffee";

/// The name of the global settings file (in ~/.config/toffee/).
pub const GLOBAL_SETTINGS_FILENAME: &str = "config.toml";

/// Overrides the location of the global settings file when set.
pub const GLOBAL_SETTINGS_ENV_VAR: &str = "TOFFEE_CONFIG";

/// Extension of the per-environment variables file.
pub const VARIABLES_EXTENSION: &str = "tfvars";

/// Extension of the per-environment backend configuration file.
pub const BACKEND_EXTENSION: &str = "tfbackend";

/// Extension of the wrapped tool's own configuration files, used to detect a project root.
pub const TOOL_CONFIG_EXTENSION: &str = "tf";

/// Exported to the child process with the name of the resolved environment.
pub const ENVIRONMENT_ENV_VAR: &str = "TOFFEE_ENVIRONMENT";

/// The flag that skips the wrapped tool's interactive approval.
pub const AUTO_APPROVE_FLAG: &str = "-auto-approve";

/// Exit code for failures on our side of the boundary (bad settings, unknown
/// environment, tool not spawnable). Chosen outside the range the wrapped tool uses.
pub const WRAPPER_FAILURE_EXIT_CODE: i32 = 125;

/// Exit code when the user interrupts the run.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
