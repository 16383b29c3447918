//! Domain logic for the hostexec service.
//!
//! Everything here is free of HTTP concerns: command validation, script
//! resolution, execution context construction, child process management,
//! result reporting, and read-only browsing of the output directory.

pub mod error;
pub mod execution;
pub mod outputs;
pub mod types;
