//! Result reporting.
//!
//! Turns a captured [`ExecutionResult`] into either the value returned to
//! the caller or an [`ExecutionFailure`] the boundary layer surfaces as a
//! server-side failure. Script runs are annotated with an
//! [`ExecutionSummary`] so the caller can see exactly what was attempted.

use serde::Serialize;

use super::context::ScriptParameters;
use super::result::ExecutionResult;

/// What was run, for auditability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    /// Script name as requested.
    pub script: String,
    /// Fully resolved command line.
    pub command: String,
    pub parameters: ScriptParameters,
}

impl ExecutionSummary {
    /// Multi-line, human-readable form.
    ///
    /// ```text
    /// Script: deploy.sh
    /// Command: bash /srv/scripts/deploy.sh "repoA"
    /// Parameters: repository=repoA, platform=, publish_type=, ext=
    /// ```
    pub fn render(&self) -> String {
        format!(
            "Script: {}\nCommand: {}\nParameters: {}",
            self.script,
            self.command,
            self.parameters.describe()
        )
    }
}

/// A captured failure (launch failure, non-zero exit, or timeout) ready to
/// be shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionFailure {
    /// Everything the caller needs in one string.
    pub message: String,
    pub exit_code: i32,
    pub timed_out: bool,
    /// The process never started.
    pub launch_failed: bool,
}

impl ExecutionFailure {
    fn new(message: String, result: &ExecutionResult) -> Self {
        Self {
            message,
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            launch_failed: result.is_launch_failure(),
        }
    }
}

/// Report a raw command run.
pub fn report_command(result: ExecutionResult) -> Result<ExecutionResult, ExecutionFailure> {
    if result.success {
        return Ok(result);
    }
    Err(ExecutionFailure::new(
        format!("Command failed: {}", failure_detail(&result)),
        &result,
    ))
}

/// Report a script run, folding `summary` into the output or the failure.
pub fn report_script(
    mut result: ExecutionResult,
    summary: &ExecutionSummary,
) -> Result<ExecutionResult, ExecutionFailure> {
    let rendered = summary.render();

    if !result.success {
        let message = format!(
            "Script execution failed\n{rendered}\nError: {}",
            failure_detail(&result)
        );
        return Err(ExecutionFailure::new(message, &result));
    }

    result.output = if result.output.is_empty() {
        rendered
    } else {
        format!("{rendered}\n\n{}", result.output)
    };
    Ok(result)
}

/// Captured error text, or the exit code when the process wrote no stderr.
fn failure_detail(result: &ExecutionResult) -> String {
    match &result.error {
        Some(error) => error.clone(),
        None => format!("exited with code {}", result.exit_code),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
