//! Request handlers.
//!
//! Handlers are thin: they extract input, delegate to the orchestrator or
//! the output browser, and map errors via [`AppError`](crate::error::AppError).

pub mod files;
pub mod shell;
