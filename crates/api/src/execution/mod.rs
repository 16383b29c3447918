//! Execution orchestration service.
//!
//! The [`orchestrator::ExecutionOrchestrator`] ties the core engine pieces
//! together behind the three operations the HTTP layer exposes.

pub mod orchestrator;
