pub mod files;
pub mod health;
pub mod shell;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /shell/execute                                   run a raw command (POST)
/// /shell/scripts                                   list scripts (GET)
/// /shell/scripts/{script_name}                     run a script (POST)
///
/// /files/list                                      list output root (GET)
/// /files/list/{*path}                              list a subdirectory (GET)
/// /files/read/{*path}                              read a text file (GET)
/// /files/info/{*path}                              file or directory metadata (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/shell", shell::router())
        .nest("/files", files::router())
}
