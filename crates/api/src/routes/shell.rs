//! Route definitions for command and script execution.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shell;
use crate::state::AppState;

/// Routes mounted at `/shell`.
///
/// ```text
/// POST   /execute                   -> execute_command
/// GET    /scripts                   -> list_scripts
/// POST   /scripts/{script_name}     -> execute_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/execute", post(shell::execute_command))
        .route("/scripts", get(shell::list_scripts))
        .route("/scripts/{script_name}", post(shell::execute_script))
}
