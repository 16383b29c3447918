//! Handlers for command and script execution.
//!
//! Pre-spawn rejections map to 4xx via [`AppError::Exec`]; runs that
//! completed unsuccessfully map to a 500 carrying the captured error text.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use hostexec_core::execution::report::{report_command, report_script};
use hostexec_core::execution::{CommandRequest, ExecutionResult, ScriptParameters};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /shell/execute
///
/// Run a raw command line through the host shell.
pub async fn execute_command(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<ExecutionResult>>> {
    let Json(request) = payload?;
    let result = state.orchestrator.execute_command(&request).await?;
    let result = report_command(result)?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /shell/scripts
///
/// List runnable scripts in the scripts directory.
pub async fn list_scripts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let scripts = state.orchestrator.list_scripts().await?;
    Ok(Json(DataResponse { data: scripts }))
}

/// POST /shell/scripts/{script_name}
///
/// Run a script. The JSON body carries [`ScriptParameters`] and may be
/// omitted entirely; a body that is present but malformed is rejected.
pub async fn execute_script(
    State(state): State<AppState>,
    Path(script_name): Path<String>,
    body: Result<Option<Json<ScriptParameters>>, JsonRejection>,
) -> AppResult<Json<DataResponse<ExecutionResult>>> {
    let params = body?.map(|Json(p)| p).unwrap_or_default();
    let run = state
        .orchestrator
        .execute_script(&script_name, &params)
        .await?;
    let result = report_script(run.result, &run.summary)?;
    Ok(Json(DataResponse { data: result }))
}
