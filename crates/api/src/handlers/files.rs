//! Read-only handlers for the output directory.

use axum::extract::{Path, State};
use axum::Json;
use hostexec_core::outputs::{FileContent, FileInfo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /files/list
///
/// List the output root.
pub async fn list_root(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<FileInfo>>>> {
    let items = state.outputs.list("").await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /files/list/{*path}
///
/// List a directory below the output root.
pub async fn list_directory(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Json<DataResponse<Vec<FileInfo>>>> {
    let items = state.outputs.list(&path).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /files/read/{*path}
///
/// Return the contents of a text file.
pub async fn read_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Json<DataResponse<FileContent>>> {
    let file = state.outputs.read(&path).await?;
    Ok(Json(DataResponse { data: file }))
}

/// GET /files/info/{*path}
pub async fn path_info(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Json<DataResponse<FileInfo>>> {
    let info = state.outputs.info(&path).await?;
    Ok(Json(DataResponse { data: info }))
}
