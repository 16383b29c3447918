//! Execution outcome types shared by every stage of the engine.
//!
//! [`ExecutionResult`] is what a child process produced. [`ExecError`] covers
//! the rejections that happen *before* any process is spawned.

use serde::{Deserialize, Serialize};

/// Exit code reported when the process could not be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Exit code reported when the process was killed after exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured outcome of one child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// `true` iff the process exited with code 0 before its timeout.
    pub success: bool,
    /// Trimmed stdout.
    pub output: String,
    /// Trimmed stderr, or the launch diagnostic. `None` when there was nothing.
    pub error: Option<String>,
    /// Process exit code, or one of the sentinel codes above.
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the process was killed by the runner's timeout.
    #[serde(default)]
    pub timed_out: bool,
    /// Whether stdout or stderr exceeded the capture limit and was cut off.
    #[serde(default)]
    pub output_truncated: bool,
}

impl ExecutionResult {
    /// Build a result for a process that ran to completion.
    ///
    /// Empty (after trimming) stderr becomes `None`; non-empty stderr is kept
    /// even when the exit code is zero.
    pub fn completed(exit_code: i32, stdout: &str, stderr: &str, duration_ms: u64) -> Self {
        let stderr = stderr.trim();
        Self {
            success: exit_code == 0,
            output: stdout.trim().to_string(),
            error: (!stderr.is_empty()).then(|| stderr.to_string()),
            exit_code,
            duration_ms,
            timed_out: false,
            output_truncated: false,
        }
    }

    /// Build a result for a process that never started.
    pub fn launch_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(diagnostic.into()),
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            duration_ms: 0,
            timed_out: false,
            output_truncated: false,
        }
    }

    /// Build a result for a process killed after `elapsed_ms`.
    pub fn timed_out(elapsed_ms: u64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(format!("Process timed out after {elapsed_ms}ms")),
            exit_code: TIMEOUT_EXIT_CODE,
            duration_ms: elapsed_ms,
            timed_out: true,
            output_truncated: false,
        }
    }

    /// Mark the captured output as cut off at the capture limit.
    pub fn with_truncation(mut self, truncated: bool) -> Self {
        self.output_truncated = truncated;
        self
    }

    /// Whether the process never started.
    pub fn is_launch_failure(&self) -> bool {
        !self.timed_out && self.exit_code == LAUNCH_FAILURE_EXIT_CODE
    }
}

/// Rejections raised before a child process is spawned.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The command contains a denylisted pattern.
    #[error("Forbidden command detected (matched '{pattern}')")]
    ForbiddenCommand {
        /// The denylist entry that matched.
        pattern: &'static str,
    },
    /// The request itself is malformed (empty command, missing working dir).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// No script with this name exists in the scripts root.
    #[error("Script not found: {0}")]
    ScriptNotFound(String),
    /// The script exists but its extension has no known interpreter.
    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),
    /// Filesystem error while preparing or enumerating the scripts root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
