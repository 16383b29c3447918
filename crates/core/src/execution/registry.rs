//! Script registry backed by a fixed scripts directory.
//!
//! A script is any regular file under the root whose extension maps to an
//! [`InterpreterKind`]. The root is created on first use and is otherwise
//! only read, so concurrent requests share it without locking.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use super::result::ExecError;

/// Extensions recognised as scripts, without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["sh", "bat", "cmd", "ps1"];

/// How a script file is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpreterKind {
    /// `.sh`, run through the configured shell binary.
    Shell,
    /// `.bat` / `.cmd`, run directly as an executable.
    BatchOrCmd,
    /// `.ps1`, run through a PowerShell host with `-File`.
    PowerShell,
}

impl InterpreterKind {
    /// Determine the interpreter from a file name's extension (case-sensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "sh" => Some(Self::Shell),
            "bat" | "cmd" => Some(Self::BatchOrCmd),
            "ps1" => Some(Self::PowerShell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::BatchOrCmd => "batch_or_cmd",
            Self::PowerShell => "powershell",
        }
    }
}

/// A script name resolved to a launchable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDescriptor {
    /// Name as requested, relative to the scripts root.
    pub name: String,
    /// Canonical absolute path of the script file.
    pub absolute_path: PathBuf,
    pub interpreter_kind: InterpreterKind,
}

/// Resolves and enumerates scripts under a single root directory.
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    root: PathBuf,
}

impl ScriptRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the scripts root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), ExecError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Resolve `script_name` to a [`ScriptDescriptor`].
    ///
    /// Existence is checked before the extension, so an unknown name is
    /// always [`ExecError::ScriptNotFound`] regardless of its suffix. Names
    /// that are absolute or resolve outside the root (through `..` or a
    /// symlink) are reported as not found as well.
    pub async fn resolve(&self, script_name: &str) -> Result<ScriptDescriptor, ExecError> {
        let not_found = || ExecError::ScriptNotFound(script_name.to_string());

        if script_name.is_empty() || Path::new(script_name).is_absolute() {
            return Err(not_found());
        }

        let candidate = self.root.join(script_name);
        match fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(not_found()),
        }

        let canonical_root = fs::canonicalize(&self.root)
            .await
            .map_err(|_| not_found())?;
        let absolute_path = fs::canonicalize(&candidate)
            .await
            .map_err(|_| not_found())?;
        if !absolute_path.starts_with(&canonical_root) {
            tracing::warn!(script = %script_name, "Rejected script path outside scripts root");
            return Err(not_found());
        }

        let interpreter_kind = InterpreterKind::from_path(Path::new(script_name))
            .ok_or_else(|| ExecError::UnsupportedScriptType(script_name.to_string()))?;

        Ok(ScriptDescriptor {
            name: script_name.to_string(),
            absolute_path,
            interpreter_kind,
        })
    }

    /// List script file names directly under the root, sorted by name.
    ///
    /// Creates the root if it is missing.
    pub async fn list(&self) -> Result<Vec<String>, ExecError> {
        self.ensure_root().await?;

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if InterpreterKind::from_path(&path).is_none() {
                continue;
            }
            // Follows symlinks, matching what `resolve` accepts.
            let is_file = fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::execution::test_helpers::write_file;

    #[test]
    fn interpreter_from_extension() {
        assert_eq!(
            InterpreterKind::from_path(Path::new("deploy.sh")),
            Some(InterpreterKind::Shell)
        );
        assert_eq!(
            InterpreterKind::from_path(Path::new("build.bat")),
            Some(InterpreterKind::BatchOrCmd)
        );
        assert_eq!(
            InterpreterKind::from_path(Path::new("build.cmd")),
            Some(InterpreterKind::BatchOrCmd)
        );
        assert_eq!(
            InterpreterKind::from_path(Path::new("setup.ps1")),
            Some(InterpreterKind::PowerShell)
        );
        assert_eq!(InterpreterKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(InterpreterKind::from_path(Path::new("Makefile")), None);
        assert_eq!(InterpreterKind::from_path(Path::new("UPPER.SH")), None);
    }

    #[test]
    fn every_supported_extension_maps_to_a_kind() {
        for ext in SUPPORTED_EXTENSIONS {
            let name = format!("x.{ext}");
            assert!(InterpreterKind::from_path(Path::new(&name)).is_some(), "{ext}");
        }
    }

    #[tokio::test]
    async fn resolve_existing_script() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "deploy.sh", "echo deploy\n");
        let registry = ScriptRegistry::new(dir.path());

        let descriptor = registry.resolve("deploy.sh").await.expect("resolve");
        assert_eq!(descriptor.name, "deploy.sh");
        assert_eq!(descriptor.interpreter_kind, InterpreterKind::Shell);
        assert!(descriptor.absolute_path.is_absolute());
        assert!(descriptor.absolute_path.ends_with("deploy.sh"));
    }

    #[tokio::test]
    async fn resolve_script_in_subdirectory() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "ci/release.ps1", "Write-Output hi\n");
        let registry = ScriptRegistry::new(dir.path());

        let descriptor = registry.resolve("ci/release.ps1").await.expect("resolve");
        assert_eq!(descriptor.interpreter_kind, InterpreterKind::PowerShell);
    }

    #[tokio::test]
    async fn resolve_missing_script_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ScriptRegistry::new(dir.path());

        assert_matches!(
            registry.resolve("missing.sh").await,
            Err(ExecError::ScriptNotFound(name)) if name == "missing.sh"
        );
        assert_matches!(
            registry.resolve("missing.txt").await,
            Err(ExecError::ScriptNotFound(_))
        );
    }

    #[tokio::test]
    async fn resolve_missing_root_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ScriptRegistry::new(dir.path().join("absent"));
        assert_matches!(
            registry.resolve("deploy.sh").await,
            Err(ExecError::ScriptNotFound(_))
        );
    }

    #[tokio::test]
    async fn resolve_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("folder.sh")).expect("mkdir");
        let registry = ScriptRegistry::new(dir.path());
        assert_matches!(
            registry.resolve("folder.sh").await,
            Err(ExecError::ScriptNotFound(_))
        );
    }

    #[tokio::test]
    async fn resolve_unsupported_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "notes.txt", "hello\n");
        let registry = ScriptRegistry::new(dir.path());
        assert_matches!(
            registry.resolve("notes.txt").await,
            Err(ExecError::UnsupportedScriptType(name)) if name == "notes.txt"
        );
    }

    #[tokio::test]
    async fn resolve_rejects_escape_from_root() {
        let outer = tempfile::tempdir().expect("tempdir");
        write_file(outer.path(), "secret.sh", "echo secret\n");
        let root = outer.path().join("scripts");
        std::fs::create_dir(&root).expect("mkdir");
        let registry = ScriptRegistry::new(&root);

        assert_matches!(
            registry.resolve("../secret.sh").await,
            Err(ExecError::ScriptNotFound(_))
        );
        let absolute = outer.path().join("secret.sh");
        assert_matches!(
            registry.resolve(absolute.to_str().expect("utf-8 path")).await,
            Err(ExecError::ScriptNotFound(_))
        );
        assert_matches!(registry.resolve("").await, Err(ExecError::ScriptNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolve_rejects_symlink_escape() {
        let outer = tempfile::tempdir().expect("tempdir");
        let target = write_file(outer.path(), "outside.sh", "echo out\n");
        let root = outer.path().join("scripts");
        std::fs::create_dir(&root).expect("mkdir");
        std::os::unix::fs::symlink(&target, root.join("link.sh")).expect("symlink");
        let registry = ScriptRegistry::new(&root);

        assert_matches!(
            registry.resolve("link.sh").await,
            Err(ExecError::ScriptNotFound(_))
        );
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "zeta.sh", "");
        write_file(dir.path(), "alpha.ps1", "");
        write_file(dir.path(), "build.cmd", "");
        write_file(dir.path(), "legacy.bat", "");
        write_file(dir.path(), "readme.md", "");
        write_file(dir.path(), "nested/inner.sh", "");
        let registry = ScriptRegistry::new(dir.path());

        let names = registry.list().await.expect("list");
        assert_eq!(names, vec!["alpha.ps1", "build.cmd", "legacy.bat", "zeta.sh"]);
    }

    #[tokio::test]
    async fn list_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "a.sh", "");
        write_file(dir.path(), "b.sh", "");
        let registry = ScriptRegistry::new(dir.path());

        let first = registry.list().await.expect("list");
        let second = registry.list().await.expect("list");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn list_creates_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("scripts");
        let registry = ScriptRegistry::new(&root);

        let names = registry.list().await.expect("list");
        assert!(names.is_empty());
        assert!(root.is_dir());
    }
}
