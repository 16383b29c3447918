//! Command and script execution engine.
//!
//! Requests flow through the [`validator`] (raw commands) or the
//! [`registry`] (named scripts), then the [`context`] builder, the
//! [`runner`], and finally the [`report`] layer. Nothing in this module
//! touches HTTP; the API crate decides which outcomes become error responses.

pub mod context;
pub mod registry;
pub mod report;
pub mod result;
pub mod runner;
pub mod validator;

pub use context::{CommandRequest, ExecutionContext, Interpreters, ScriptParameters};
pub use registry::{InterpreterKind, ScriptDescriptor, ScriptRegistry};
pub use report::{ExecutionFailure, ExecutionSummary};
pub use result::{ExecError, ExecutionResult};
pub use runner::{ProcessRunner, RunnerLimits};
