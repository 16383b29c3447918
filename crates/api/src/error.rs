use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hostexec_core::error::CoreError;
use hostexec_core::execution::{ExecError, ExecutionFailure};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and the execution engine's errors, and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `hostexec_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request rejected by the execution engine before anything ran.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A command or script ran (or tried to) and failed.
    #[error(transparent)]
    ExecutionFailed(#[from] ExecutionFailure),

    /// A request body that could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{key}' not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Execution engine rejections ---
            AppError::Exec(exec) => match exec {
                ExecError::ForbiddenCommand { .. } => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN_COMMAND",
                    "Forbidden command detected".to_string(),
                ),
                ExecError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
                }
                ExecError::ScriptNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "SCRIPT_NOT_FOUND",
                    "Script not found".to_string(),
                ),
                ExecError::UnsupportedScriptType(_) => (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_SCRIPT_TYPE",
                    "Unsupported script type".to_string(),
                ),
                ExecError::Io(err) => {
                    tracing::error!(error = %err, "Execution engine I/O error");
                    internal()
                }
            },

            // Captured process failures are shown verbatim: the caller needs
            // the stderr/diagnostic text to act on them.
            AppError::ExecutionFailed(failure) => {
                tracing::warn!(
                    exit_code = failure.exit_code,
                    timed_out = failure.timed_out,
                    launch_failed = failure.launch_failed,
                    "Execution failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXECUTION_FAILED",
                    failure.message.clone(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Sanitized 500 triple; details go to the log, never to the caller.
fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
