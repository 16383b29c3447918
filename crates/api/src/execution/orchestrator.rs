//! Central execution orchestrator service.
//!
//! Coordinates validation, script lookup, context construction and process
//! execution. Held in [`AppState`](crate::state::AppState) as an
//! `Arc<ExecutionOrchestrator>`; it carries no per-request state, so
//! concurrent requests never contend on anything but the runner's
//! admission limit.

use std::path::PathBuf;

use hostexec_core::execution::context::{
    build_command_context, build_script_context, host_environment,
};
use hostexec_core::execution::validator::validate_command;
use hostexec_core::execution::{
    CommandRequest, ExecError, ExecutionResult, ExecutionSummary, Interpreters, ProcessRunner,
    ScriptParameters, ScriptRegistry,
};

use crate::config::ServerConfig;

/// A finished script run together with what was attempted.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub result: ExecutionResult,
    pub summary: ExecutionSummary,
}

/// Runs raw commands and registered scripts.
///
/// Lifecycle of a command:
/// 1. Reject blank commands and denylisted patterns (nothing is spawned).
/// 2. Verify the working directory, if one was given.
/// 3. Build a fresh context from the host environment plus overrides.
/// 4. Run it and hand back the captured result.
///
/// Lifecycle of a script:
/// 1. Ensure the scripts root exists and resolve the name.
/// 2. Build a context with the `SCRIPT_*` parameters.
/// 3. Run it inside the scripts root and attach an execution summary.
pub struct ExecutionOrchestrator {
    registry: ScriptRegistry,
    runner: ProcessRunner,
    interpreters: Interpreters,
}

impl ExecutionOrchestrator {
    pub fn new(registry: ScriptRegistry, runner: ProcessRunner, interpreters: Interpreters) -> Self {
        Self {
            registry,
            runner,
            interpreters,
        }
    }

    /// Build an orchestrator from server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            ScriptRegistry::new(&config.scripts_dir),
            ProcessRunner::new(config.runner_limits()),
            config.interpreters(),
        )
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Run a raw command line.
    ///
    /// `Err` only for requests rejected before spawning; a command that ran
    /// and failed is an `Ok` result with `success == false`.
    pub async fn execute_command(
        &self,
        request: &CommandRequest,
    ) -> Result<ExecutionResult, ExecError> {
        if request.command.trim().is_empty() {
            return Err(ExecError::InvalidInput("command must not be empty".to_string()));
        }

        if let Err(err) = validate_command(&request.command) {
            tracing::warn!(command = %request.command, error = %err, "Rejected forbidden command");
            return Err(err);
        }

        let working_dir = match &request.working_dir {
            Some(dir) => {
                let meta = tokio::fs::metadata(dir).await.map_err(|_| {
                    ExecError::InvalidInput("Working directory does not exist".to_string())
                })?;
                if !meta.is_dir() {
                    return Err(ExecError::InvalidInput(
                        "Working directory is not a directory".to_string(),
                    ));
                }
                Some(PathBuf::from(dir))
            }
            None => None,
        };

        let ctx = build_command_context(
            &host_environment(),
            &request.env,
            &request.command,
            working_dir,
        );
        Ok(self.runner.run(&ctx).await)
    }

    /// Run a script from the scripts root with `params`.
    pub async fn execute_script(
        &self,
        script_name: &str,
        params: &ScriptParameters,
    ) -> Result<ScriptRun, ExecError> {
        self.registry.ensure_root().await?;
        let descriptor = self.registry.resolve(script_name).await?;

        let ctx = build_script_context(
            &host_environment(),
            &descriptor,
            params,
            &self.interpreters,
            Some(self.registry.root().to_path_buf()),
        );
        tracing::info!(
            script = %descriptor.name,
            interpreter = descriptor.interpreter_kind.as_str(),
            "Executing script"
        );

        let result = self.runner.run(&ctx).await;
        Ok(ScriptRun {
            result,
            summary: ExecutionSummary {
                script: descriptor.name,
                command: ctx.resolved_command,
                parameters: params.clone(),
            },
        })
    }

    /// Names of runnable scripts, sorted. Creates the scripts root if needed.
    pub async fn list_scripts(&self) -> Result<Vec<String>, ExecError> {
        self.registry.list().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
