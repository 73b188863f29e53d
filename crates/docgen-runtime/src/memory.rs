/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory FileStore for tests and embedders.
 */

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::traits::{
    FileStore, PathKind, RuntimeError, RuntimeResult, compile_pattern, file_name_matches,
};

/// File store that keeps every file in memory.
///
/// Behaves like the native store for the operations the generator uses
/// (writes require an existing parent directory, removing a non-empty
/// directory fails) and additionally counts reads per path, which makes
/// memoization observable in tests.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    reads: RefCell<HashMap<PathBuf, usize>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating all of its parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.insert_file(path, contents);
        self
    }

    /// Insert a file, creating all of its parent directories.
    pub fn insert_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dirs(parent);
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.as_ref().to_vec());
    }

    /// Number of times `path` was read through [`FileStore::file_read`].
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .borrow()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot of every stored file path.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    fn insert_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn children(&self, path: &Path) -> Vec<PathBuf> {
        let files = self.files.borrow();
        let dirs = self.dirs.borrow();
        let mut children: BTreeSet<PathBuf> = BTreeSet::new();
        for candidate in files.keys().chain(dirs.iter()) {
            if candidate.parent() == Some(path) {
                children.insert(candidate.clone());
            }
        }
        children.into_iter().collect()
    }
}

impl FileStore for MemoryFileStore {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let contents = self
            .files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(path.to_path_buf()))?;
        *self.reads.borrow_mut().entry(path.to_path_buf()).or_insert(0) += 1;
        Ok(contents)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| RuntimeError::NotFound(path.to_path_buf()))?;
        if !self.dirs.borrow().contains(parent) {
            return Err(RuntimeError::NotFound(parent.to_path_buf()));
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn file_remove(&self, path: &Path) -> RuntimeResult<()> {
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RuntimeError::NotFound(path.to_path_buf()))
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let is_file = self.files.borrow().contains_key(path);
        let is_dir = self.dirs.borrow().contains(path);
        Ok(match kind {
            None => is_file || is_dir,
            Some(PathKind::File) => is_file,
            Some(PathKind::Directory) => is_dir,
        })
    }

    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        if !recursive {
            if let Some(parent) = path.parent() {
                if !self.dirs.borrow().contains(parent) {
                    return Err(RuntimeError::NotFound(parent.to_path_buf()));
                }
            }
        }
        self.insert_dirs(path);
        Ok(())
    }

    fn dir_remove(&self, path: &Path) -> RuntimeResult<()> {
        if !self.dirs.borrow().contains(path) {
            return Err(RuntimeError::NotFound(path.to_path_buf()));
        }
        if !self.children(path).is_empty() {
            return Err(RuntimeError::io(
                path,
                std::io::Error::other("directory not empty"),
            ));
        }
        self.dirs.borrow_mut().remove(path);
        Ok(())
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        if !self.dirs.borrow().contains(path) {
            return Err(RuntimeError::NotFound(path.to_path_buf()));
        }
        Ok(self.children(path))
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        if !self.dirs.borrow().contains(dir) {
            return Err(RuntimeError::NotFound(dir.to_path_buf()));
        }
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.starts_with(dir) && file_name_matches(&pattern, p))
            .cloned()
            .collect())
    }

    fn list_directories(&self, dir: &Path, pattern: &str) -> RuntimeResult<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        let dirs = self.dirs.borrow();
        Ok(self
            .dir_list(dir)?
            .into_iter()
            .filter(|p| dirs.contains(p) && file_name_matches(&pattern, p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_read_counts() {
        let store = MemoryFileStore::new().with_file("/root/a/b.md", "hello");

        assert!(store.is_dir(Path::new("/root/a")).unwrap());
        assert_eq!(store.read_count("/root/a/b.md"), 0);
        assert_eq!(
            store.file_read_string(Path::new("/root/a/b.md")).unwrap(),
            "hello"
        );
        store.file_read(Path::new("/root/a/b.md")).unwrap();
        assert_eq!(store.read_count("/root/a/b.md"), 2);
    }

    #[test]
    fn test_write_requires_parent() {
        let store = MemoryFileStore::new();
        let err = store
            .file_write(Path::new("/root/missing/x.md"), b"x")
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound(_)));

        store.dir_create(Path::new("/root/missing"), true).unwrap();
        store
            .file_write(Path::new("/root/missing/x.md"), b"x")
            .unwrap();
        assert!(store.is_file(Path::new("/root/missing/x.md")).unwrap());
    }

    #[test]
    fn test_dir_remove_refuses_non_empty() {
        let store = MemoryFileStore::new().with_file("/root/d/x.md", "x");
        assert!(store.dir_remove(Path::new("/root/d")).is_err());

        store.file_remove(Path::new("/root/d/x.md")).unwrap();
        assert!(store.dir_is_empty(Path::new("/root/d")).unwrap());
        store.dir_remove(Path::new("/root/d")).unwrap();
        assert!(!store.is_dir(Path::new("/root/d")).unwrap());
    }

    #[test]
    fn test_listings() {
        let store = MemoryFileStore::new()
            .with_file("/src/a.md", "")
            .with_file("/src/sub/b.md", "")
            .with_file("/src/sub/c.txt", "")
            .with_file("/src/other/d.md", "");

        assert_eq!(
            store.list_files(Path::new("/src"), "*.md").unwrap(),
            vec![
                PathBuf::from("/src/a.md"),
                PathBuf::from("/src/other/d.md"),
                PathBuf::from("/src/sub/b.md"),
            ]
        );
        assert_eq!(
            store.list_directories(Path::new("/src"), "*").unwrap(),
            vec![PathBuf::from("/src/other"), PathBuf::from("/src/sub")]
        );
    }
}
