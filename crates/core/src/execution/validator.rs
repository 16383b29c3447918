//! Command denylist.
//!
//! Raw commands are screened by case-insensitive substring containment
//! against [`FORBIDDEN_PATTERNS`]. Matching is deliberately coarse: a
//! command that merely *mentions* a pattern (e.g. `echo add`) is rejected.

use super::result::ExecError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower-case substrings that cause a command to be rejected.
///
/// - `rm -rf`: recursive force delete
/// - `mkfs`: filesystem format
/// - `dd`: raw disk write
/// - `:(){ :|:& };:`: fork bomb
pub const FORBIDDEN_PATTERNS: &[&str] = &["rm -rf", "mkfs", "dd", ":(){ :|:& };:"];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject `command` if it contains any [`FORBIDDEN_PATTERNS`] entry.
///
/// Total over any input; the first matching pattern is reported.
pub fn validate_command(command: &str) -> Result<(), ExecError> {
    let folded = command.to_lowercase();
    match FORBIDDEN_PATTERNS
        .iter()
        .copied()
        .find(|pattern| folded.contains(pattern))
    {
        Some(pattern) => Err(ExecError::ForbiddenCommand { pattern }),
        None => Ok(()),
    }
}
