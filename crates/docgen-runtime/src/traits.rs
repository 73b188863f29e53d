/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the FileStore trait and supporting types for the storage layer.
 *
 * This abstraction allows the generator to run against different backends:
 * - NativeFileStore: the real filesystem using std
 * - MemoryFileStore: an in-memory tree for tests and embedders
 */

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for file store operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during file store operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Standard I/O error, with the path that was being accessed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested path does not exist
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File contents are not valid UTF-8
    #[error("File is not valid UTF-8: {}", .0.display())]
    InvalidUtf8(PathBuf),

    /// A listing pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl RuntimeError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return RuntimeError::NotFound(path.into());
        }
        RuntimeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Storage operations used by the generator.
///
/// The core never touches `std::fs` directly: discovery, reads of templates
/// and example files, artifact writes, stale deletion and manifest
/// persistence all go through this trait. Paths are absolute; listing
/// results are returned sorted so runs are deterministic.
pub trait FileStore {
    /// Read the entire contents of a file.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read a file as a UTF-8 string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|_| RuntimeError::InvalidUtf8(path.to_path_buf()))
    }

    /// Write contents to a file, replacing it if it exists.
    ///
    /// The parent directory must exist; see [`FileStore::dir_create`].
    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()>;

    /// Remove a file.
    fn file_remove(&self, path: &Path) -> RuntimeResult<()>;

    /// Check whether a path exists, optionally of a specific kind.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check whether a path is a regular file.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check whether a path is a directory.
    fn is_dir(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    /// Create a directory, including missing parents when `recursive` is set.
    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()>;

    /// Remove an empty directory.
    fn dir_remove(&self, path: &Path) -> RuntimeResult<()>;

    /// List the direct children of a directory.
    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>>;

    /// Recursively list files under `dir` whose file name matches `pattern`
    /// (a shell-style glob such as `*.md`).
    fn list_files(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>>;

    /// List the direct subdirectories of `dir` whose name matches `pattern`.
    fn list_directories(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>>;

    /// Check whether a directory has no entries.
    fn dir_is_empty(&self, path: &Path) -> RuntimeResult<bool> {
        Ok(self.dir_list(path)?.is_empty())
    }
}

/// Compile a file-name pattern for the listing operations.
pub(crate) fn compile_pattern(pattern: &str) -> RuntimeResult<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|e| RuntimeError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.msg.to_string(),
    })
}

/// Check whether the final component of `path` matches `pattern`.
pub(crate) fn file_name_matches(pattern: &glob::Pattern, path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| pattern.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError::NotFound(PathBuf::from("/tmp/missing.md"));
        assert_eq!(err.to_string(), "Path not found: /tmp/missing.md");

        let err = RuntimeError::InvalidPattern {
            pattern: "[".to_string(),
            message: "invalid range pattern".to_string(),
        };
        assert!(err.to_string().contains("Invalid pattern '['"));
    }

    #[test]
    fn test_io_not_found_is_mapped() {
        let err = RuntimeError::io("/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, RuntimeError::NotFound(_)));

        let err = RuntimeError::io("/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, RuntimeError::Io { .. }));
    }

    #[test]
    fn test_file_name_matches() {
        let pattern = compile_pattern("*.md").unwrap();
        assert!(file_name_matches(&pattern, Path::new("/a/b/readme.md")));
        assert!(!file_name_matches(&pattern, Path::new("/a/b/readme.txt")));
        assert!(compile_pattern("[").is_err());
    }
}
