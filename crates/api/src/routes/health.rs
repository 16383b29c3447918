use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the scripts directory exists and is a directory.
    pub scripts_dir_ready: bool,
    /// Child processes launched since startup.
    pub processes_launched: u64,
    /// Configured per-process wall-clock limit.
    pub command_timeout_secs: u64,
}

/// GET /health -- returns service health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let scripts_dir_ready = tokio::fs::metadata(state.orchestrator.registry().root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let status = if scripts_dir_ready { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        scripts_dir_ready,
        processes_launched: state.orchestrator.runner().launch_count(),
        command_timeout_secs: state.config.command_timeout_secs,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
