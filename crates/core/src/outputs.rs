//! Read-only browsing of the output directory.
//!
//! Scripts drop build artifacts and logs under a fixed output root; the
//! console lists, stats and reads them through [`OutputBrowser`]. Every
//! request path is relative to the root and may not leave it.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest file [`OutputBrowser::read`] will return (10 MiB).
pub const MAX_READ_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions (lower-case, no dot) treated as readable text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "json", "yml", "yaml", "xml", "md", "csv", "py", "js", "html", "css", "sh",
    "bat", "ini", "conf", "properties", "env", "cfg", "toml",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metadata for one file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    /// Absolute path on the host.
    pub path: String,
    pub is_dir: bool,
    /// Size in bytes.
    pub size: u64,
    pub modified_time: Timestamp,
}

/// Contents of a text file plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub content: String,
    pub file_info: FileInfo,
}

/// Whether `path` has one of the [`TEXT_EXTENSIONS`] (case-insensitive).
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Browses a single output root.
#[derive(Debug, Clone)]
pub struct OutputBrowser {
    root: PathBuf,
}

impl OutputBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List a directory: hidden entries skipped, directories first, then by
    /// case-insensitive name.
    pub async fn list(&self, relative: &str) -> Result<Vec<FileInfo>, CoreError> {
        let dir = self.locate(relative).await?;
        let meta = fs::metadata(&dir).await.map_err(io_internal)?;
        if !meta.is_dir() {
            return Err(CoreError::Validation(format!(
                "Path is not a directory: {relative}"
            )));
        }

        let mut items = Vec::new();
        let mut entries = fs::read_dir(&dir).await.map_err(io_internal)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_internal)? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            items.push(file_info(&entry.path()).await?);
        }

        items.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(items)
    }

    /// Read a text file of at most [`MAX_READ_BYTES`].
    pub async fn read(&self, relative: &str) -> Result<FileContent, CoreError> {
        let path = self.locate(relative).await?;
        let info = file_info(&path).await?;

        if info.is_dir {
            return Err(CoreError::Validation(format!("Path is not a file: {relative}")));
        }
        if info.size > MAX_READ_BYTES {
            return Err(CoreError::Validation(format!(
                "File is too large to read ({} bytes, limit {MAX_READ_BYTES})",
                info.size
            )));
        }
        if !is_text_file(&path) {
            return Err(CoreError::Validation(format!(
                "File type not supported: {relative}"
            )));
        }

        let bytes = fs::read(&path).await.map_err(io_internal)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            CoreError::Validation(format!("File is not a valid text file: {relative}"))
        })?;

        Ok(FileContent {
            content,
            file_info: info,
        })
    }

    /// Metadata for a file or directory.
    pub async fn info(&self, relative: &str) -> Result<FileInfo, CoreError> {
        let path = self.locate(relative).await?;
        file_info(&path).await
    }

    /// Resolve `relative` to an existing path inside the root.
    ///
    /// Lexical `..`/absolute components are rejected up front; symlinks are
    /// caught by comparing canonical paths.
    async fn locate(&self, relative: &str) -> Result<PathBuf, CoreError> {
        let rel = Path::new(relative);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CoreError::Forbidden(
                "Access to parent directory is not allowed".to_string(),
            ));
        }

        let target = self.root.join(rel);
        if fs::metadata(&target).await.is_err() {
            return Err(CoreError::NotFound {
                entity: "path",
                key: relative.to_string(),
            });
        }

        let root = fs::canonicalize(&self.root).await.map_err(io_internal)?;
        let resolved = fs::canonicalize(&target).await.map_err(io_internal)?;
        if !resolved.starts_with(&root) {
            return Err(CoreError::Forbidden(
                "Access to parent directory is not allowed".to_string(),
            ));
        }
        Ok(resolved)
    }
}

async fn file_info(path: &Path) -> Result<FileInfo, CoreError> {
    let meta = fs::metadata(path).await.map_err(io_internal)?;
    let modified_time = meta
        .modified()
        .map(Timestamp::from)
        .map_err(io_internal)?;

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_string_lossy().into_owned(),
        is_dir: meta.is_dir(),
        size: meta.len(),
        modified_time,
    })
}

fn io_internal(err: std::io::Error) -> CoreError {
    CoreError::Internal(err.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
