/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * FileStore implementation backed by the local filesystem.
 */

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::traits::{
    FileStore, PathKind, RuntimeError, RuntimeResult, compile_pattern, file_name_matches,
};

/// File store with full access to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileStore;

impl NativeFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for NativeFileStore {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        fs::read(path).map_err(|e| RuntimeError::io(path, e))
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        fs::write(path, contents).map_err(|e| RuntimeError::io(path, e))
    }

    fn file_remove(&self, path: &Path) -> RuntimeResult<()> {
        fs::remove_file(path).map_err(|e| RuntimeError::io(path, e))
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(RuntimeError::io(path, e)),
        };

        Ok(match kind {
            None => true,
            Some(PathKind::File) => metadata.is_file(),
            Some(PathKind::Directory) => metadata.is_dir(),
        })
    }

    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let result = if recursive {
            fs::create_dir_all(path)
        } else {
            fs::create_dir(path)
        };
        result.map_err(|e| RuntimeError::io(path, e))
    }

    fn dir_remove(&self, path: &Path) -> RuntimeResult<()> {
        fs::remove_dir(path).map_err(|e| RuntimeError::io(path, e))
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)
            .map_err(|e| RuntimeError::io(path, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RuntimeError::io(path, e))?;
        entries.sort();
        Ok(entries)
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                match e.into_io_error() {
                    Some(io) => RuntimeError::io(path, io),
                    None => RuntimeError::NotFound(path),
                }
            })?;

            if entry.file_type().is_file() && file_name_matches(&pattern, entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn list_directories(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        let mut dirs = Vec::new();

        for path in self.dir_list(dir)? {
            if path.is_dir() && file_name_matches(&pattern, &path) {
                dirs.push(path);
            }
        }

        Ok(dirs)
    }
}
