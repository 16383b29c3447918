use std::sync::Arc;

use hostexec_core::outputs::OutputBrowser;

use crate::config::ServerConfig;
use crate::execution::orchestrator::ExecutionOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Command and script execution engine.
    pub orchestrator: Arc<ExecutionOrchestrator>,
    /// Read-only browser over the output directory.
    pub outputs: Arc<OutputBrowser>,
}

impl AppState {
    /// Assemble state from configuration.
    pub fn from_config(config: ServerConfig) -> Self {
        let orchestrator = ExecutionOrchestrator::from_config(&config);
        let outputs = OutputBrowser::new(&config.output_dir);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            outputs: Arc::new(outputs),
        }
    }
}
