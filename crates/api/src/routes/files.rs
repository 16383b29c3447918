//! Route definitions for output directory browsing.

use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// GET    /list                      -> list_root
/// GET    /list/{*path}              -> list_directory
/// GET    /read/{*path}              -> read_file
/// GET    /info/{*path}              -> path_info
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(files::list_root))
        .route("/list/{*path}", get(files::list_directory))
        .route("/read/{*path}", get(files::read_file))
        .route("/info/{*path}", get(files::path_info))
}
