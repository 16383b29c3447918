//! Per-invocation execution context.
//!
//! An [`ExecutionContext`] is an owned snapshot: argv, working directory and
//! the complete child environment. It is built fresh for every request from
//! a copy of the host environment, so nothing here ever mutates the server
//! process's own environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::registry::{InterpreterKind, ScriptDescriptor};
use crate::types::EnvMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ENV_SCRIPT_REPOSITORY: &str = "SCRIPT_REPOSITORY";
pub const ENV_SCRIPT_PLATFORM: &str = "SCRIPT_PLATFORM";
pub const ENV_SCRIPT_PUBLISH_TYPE: &str = "SCRIPT_PUBLISH_TYPE";
pub const ENV_SCRIPT_EXT: &str = "SCRIPT_EXT";

/// Default interpreter for `.sh` scripts.
pub const DEFAULT_SHELL: &str = "bash";

/// Default PowerShell host for `.ps1` scripts.
pub const DEFAULT_POWERSHELL: &str = "powershell";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A raw command line to run through the host shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Command line; must not be blank.
    pub command: String,
    /// Working directory; must exist when given.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Extra environment entries layered over the host environment.
    #[serde(default)]
    pub env: EnvMap,
}

/// Optional parameters forwarded to a named script.
///
/// Each field is exported as an environment variable (empty string when
/// absent) and, when non-empty, appended as a positional argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParameters {
    pub repository: Option<String>,
    pub platform: Option<String>,
    pub publish_type: Option<String>,
    pub ext: Option<String>,
}

impl ScriptParameters {
    /// `(env key, value)` pairs in the fixed positional order.
    fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            (ENV_SCRIPT_REPOSITORY, self.repository.as_deref()),
            (ENV_SCRIPT_PLATFORM, self.platform.as_deref()),
            (ENV_SCRIPT_PUBLISH_TYPE, self.publish_type.as_deref()),
            (ENV_SCRIPT_EXT, self.ext.as_deref()),
        ]
    }

    /// The four `SCRIPT_*` variables; absent values become `""`.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.fields()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.unwrap_or_default().to_string()))
            .collect()
    }

    /// Non-empty values in the order repository, platform, publish_type, ext.
    pub fn positional_args(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .filter_map(|(_, value)| value.filter(|v| !v.is_empty()).map(str::to_string))
            .collect()
    }

    /// Human-readable `key=value` listing used in execution summaries.
    pub fn describe(&self) -> String {
        [
            ("repository", self.repository.as_deref()),
            ("platform", self.platform.as_deref()),
            ("publish_type", self.publish_type.as_deref()),
            ("ext", self.ext.as_deref()),
        ]
        .into_iter()
        .map(|(key, value)| format!("{key}={}", value.unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Interpreter binaries used for script kinds that need one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    pub shell: String,
    pub powershell: String,
}

impl Default for Interpreters {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            powershell: DEFAULT_POWERSHELL.to_string(),
        }
    }
}

/// Everything needed to spawn one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Program to execute.
    pub program: String,
    /// Arguments after the program.
    pub args: Vec<String>,
    /// Display form of the full command line, for logs and summaries.
    pub resolved_command: String,
    /// Working directory (inherits the server's when `None`).
    pub working_dir: Option<PathBuf>,
    /// Complete child environment; replaces the inherited one.
    pub environment: EnvMap,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Snapshot the current process environment.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn host_environment() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// The host's command processor and its "run this string" flag.
pub fn host_shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Context for a raw command line, interpreted by the host shell.
///
/// `overrides` are layered over `base_env`; the caller's entries win.
pub fn build_command_context(
    base_env: &EnvMap,
    overrides: &EnvMap,
    command: &str,
    working_dir: Option<PathBuf>,
) -> ExecutionContext {
    let mut environment = base_env.clone();
    environment.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

    let (shell, flag) = host_shell();
    ExecutionContext {
        program: shell.to_string(),
        args: vec![flag.to_string(), command.to_string()],
        resolved_command: command.to_string(),
        working_dir,
        environment,
    }
}

/// Context for a resolved script.
///
/// The argv follows the interpreter template for the script's kind:
///
/// | Kind         | argv                                      |
/// |--------------|-------------------------------------------|
/// | `Shell`      | `<shell> <path> <args...>`                |
/// | `BatchOrCmd` | `<path> <args...>`                        |
/// | `PowerShell` | `<powershell> -File <path> <args...>`     |
///
/// Parameters are passed as discrete argv entries, never spliced into a
/// shell string.
pub fn build_script_context(
    base_env: &EnvMap,
    descriptor: &ScriptDescriptor,
    params: &ScriptParameters,
    interpreters: &Interpreters,
    working_dir: Option<PathBuf>,
) -> ExecutionContext {
    let mut environment = base_env.clone();
    environment.extend(params.env_vars());

    let script_path = descriptor.absolute_path.to_string_lossy().into_owned();
    let positional = params.positional_args();

    let (program, mut args) = match descriptor.interpreter_kind {
        InterpreterKind::Shell => (interpreters.shell.clone(), vec![script_path.clone()]),
        InterpreterKind::BatchOrCmd => (script_path.clone(), Vec::new()),
        InterpreterKind::PowerShell => (
            interpreters.powershell.clone(),
            vec!["-File".to_string(), script_path.clone()],
        ),
    };

    let mut resolved_command = std::iter::once(program.as_str())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    for arg in &positional {
        resolved_command.push_str(&format!(" \"{arg}\""));
    }

    args.extend(positional);

    ExecutionContext {
        program,
        args,
        resolved_command,
        working_dir,
        environment,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
