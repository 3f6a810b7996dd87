//! File system capability used by the tree reader.
//!
//! The walker, matcher and bundler never touch `std::fs` directly. They go
//! through [`FileSystem`] so tests can substitute an in-memory tree with
//! read counters and injected failures.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// One entry returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            is_file: true,
            is_symlink: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            is_file: false,
            is_symlink: false,
        }
    }
}

/// Asynchronous access to directories and text files.
pub trait FileSystem: Send + Sync + 'static {
    /// List the immediate entries of a directory.
    fn read_dir(&self, path: &Path) -> impl Future<Output = io::Result<Vec<DirEntry>>> + Send;

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

    fn join(&self, base: &Path, name: &str) -> PathBuf {
        base.join(name)
    }
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FileSystem for TokioFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            // file_type() does not follow symlinks, which is what lets the
            // walker skip them and avoid cycles
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), %err, "skipping entry without file type");
                    continue;
                }
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: file_type.is_dir(),
                is_file: file_type.is_file(),
                is_symlink: file_type.is_symlink(),
            });
        }

        Ok(entries)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
