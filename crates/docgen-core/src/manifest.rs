/*
 * manifest.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The list of files written by the previous run.
//!
//! Stored as `{"files": [...]}` in the template source directory. Paths are
//! relative to the root directory and use `/` separators.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use docgen_runtime::FileStore;
use docgen_runtime::paths::{is_contained, normalize_path};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GenerateError, Result};

/// File name of the manifest inside the source directory.
pub const MANIFEST_FILE: &str = ".docgen-metadata.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<String>,
}

impl Manifest {
    pub fn new(files: impl IntoIterator<Item = String>) -> Self {
        Manifest {
            files: files.into_iter().collect(),
        }
    }

    /// Load the manifest, or an empty one if the file does not exist.
    pub fn load(store: &dyn FileStore, path: &Path) -> Result<Self> {
        if !store.is_file(path)? {
            debug!(path = %path.display(), "no previous manifest");
            return Ok(Manifest::default());
        }

        let content = store.file_read_string(path)?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| GenerateError::Manifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        for file in &manifest.files {
            if file.is_empty() || !is_contained(&normalize_path(Path::new(file))) {
                return Err(GenerateError::Manifest {
                    path: path.to_path_buf(),
                    message: format!("entry \"{file}\" is not a path inside the root directory"),
                });
            }
        }

        Ok(manifest)
    }

    pub fn save(&self, store: &dyn FileStore, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| GenerateError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        store.file_write(path, json.as_bytes())?;
        debug!(path = %path.display(), files = self.files.len(), "manifest saved");
        Ok(())
    }

    /// Entries of this manifest that `current` no longer lists.
    pub fn stale<'a>(&'a self, current: &Manifest) -> Vec<&'a str> {
        let keep: BTreeSet<&str> = current.files.iter().map(String::as_str).collect();
        self.files
            .iter()
            .map(String::as_str)
            .filter(|f| !keep.contains(f))
            .collect()
    }
}

/// Delete stale files, then every directory their removal left empty,
/// walking upward but never past (or including) `root`.
///
/// Returns the deleted files, relative to `root`.
pub fn remove_stale(store: &dyn FileStore, root: &Path, stale: &[&str]) -> Result<Vec<String>> {
    let mut deleted = Vec::new();

    for relative in stale {
        let path = normalize_path(&root.join(relative));
        if !store.is_file(&path)? {
            continue;
        }
        store.file_remove(&path)?;
        info!(path = %relative, "removed stale file");
        deleted.push((*relative).to_string());

        prune_empty_dirs(store, root, path.parent())?;
    }

    Ok(deleted)
}

fn prune_empty_dirs(store: &dyn FileStore, root: &Path, start: Option<&Path>) -> Result<()> {
    let mut dir: Option<PathBuf> = start.map(Path::to_path_buf);
    while let Some(current) = dir {
        if current == root || !current.starts_with(root) {
            break;
        }
        if !store.is_dir(&current)? || !store.dir_is_empty(&current)? {
            break;
        }
        store.dir_remove(&current)?;
        debug!(dir = %current.display(), "removed empty directory");
        dir = current.parent().map(Path::to_path_buf);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_manifest_is_empty() {
        let store = MemoryFileStore::new();
        let manifest = Manifest::load(&store, Path::new("/root/src/.docgen-metadata.json")).unwrap();
        assert!(manifest.files.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryFileStore::new().with_file("/root/src/a.md", "");
        let path = Path::new("/root/src/.docgen-metadata.json");
        let manifest = Manifest::new(["docs/a.md".to_string(), "b.md".to_string()]);
        manifest.save(&store, path).unwrap();

        let raw = store.file_read_string(path).unwrap();
        assert_eq!(raw, "{\n  \"files\": [\n    \"docs/a.md\",\n    \"b.md\"\n  ]\n}");
        assert_eq!(Manifest::load(&store, path).unwrap(), manifest);
    }

    #[test]
    fn test_invalid_manifest() {
        let path = Path::new("/root/src/.docgen-metadata.json");
        let store = MemoryFileStore::new().with_file(path, "{\"files\": \"nope\"}");
        assert!(matches!(
            Manifest::load(&store, path),
            Err(GenerateError::Manifest { .. })
        ));

        let store = MemoryFileStore::new().with_file(path, "{\"files\": [\"../outside.md\"]}");
        let err = Manifest::load(&store, path).unwrap_err();
        assert!(err.to_string().contains("not a path inside the root directory"));
    }

    #[test]
    fn test_remove_stale_prunes_empty_dirs() {
        let store = MemoryFileStore::new()
            .with_file("/root/docs/guide/deep/old.md", "old")
            .with_file("/root/docs/kept.md", "kept");

        let previous = Manifest::new(["docs/guide/deep/old.md".into(), "docs/kept.md".into(), "gone.md".into()]);
        let current = Manifest::new(["docs/kept.md".into()]);
        let stale = previous.stale(&current);
        assert_eq!(stale, vec!["docs/guide/deep/old.md", "gone.md"]);

        let deleted = remove_stale(&store, Path::new("/root"), &stale).unwrap();
        assert_eq!(deleted, vec!["docs/guide/deep/old.md".to_string()]);
        assert!(!store.is_dir(Path::new("/root/docs/guide")).unwrap());
        assert!(store.is_dir(Path::new("/root/docs")).unwrap());
        assert!(store.is_dir(Path::new("/root")).unwrap());
    }
}
