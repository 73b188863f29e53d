/*
 * artifact.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Files produced by a generation run.
//!
//! Artifacts are collected in memory while templates are expanded and only
//! written once every template expanded and all references validated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use docgen_runtime::FileStore;
use docgen_runtime::paths::{is_contained, normalize_path, to_slash};
use tracing::info;

use crate::error::{GenerateError, Result};
use crate::manifest::Manifest;

/// One file to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the root directory, `/`-separated.
    pub path: String,
    pub content: String,
    /// Template (relative path) that produced the file.
    pub origin: String,
}

/// Artifacts keyed by their path relative to the root directory.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    root_dir: PathBuf,
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactSet {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        ArtifactSet {
            root_dir: normalize_path(root_dir.as_ref()),
            artifacts: BTreeMap::new(),
        }
    }

    /// Claim `target` for `origin`.
    ///
    /// `target` is absolute or relative to the root directory and must stay
    /// inside it. Content is stored with exactly one trailing newline. A
    /// template may overwrite its own artifact; claiming another template's
    /// artifact fails.
    pub fn insert(&mut self, origin: &str, target: &Path, content: &str) -> Result<()> {
        let path = self.relative(origin, target)?;

        if let Some(existing) = self.artifacts.get(&path) {
            if existing.origin != origin {
                return Err(GenerateError::DuplicateArtifact {
                    path,
                    first: existing.origin.clone(),
                    second: origin.to_string(),
                });
            }
        }

        let artifact = Artifact {
            path: path.clone(),
            content: format!("{}\n", content.trim_end()),
            origin: origin.to_string(),
        };
        self.artifacts.insert(path, artifact);
        Ok(())
    }

    fn relative(&self, origin: &str, target: &Path) -> Result<String> {
        let absolute = normalize_path(&self.root_dir.join(target));
        let outside = || GenerateError::PathOutsideRoot {
            path: target.display().to_string(),
            template: origin.to_string(),
        };
        let relative = absolute.strip_prefix(&self.root_dir).map_err(|_| outside())?;
        if !is_contained(relative) {
            return Err(outside());
        }
        Ok(to_slash(relative))
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.get(path)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Artifacts in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.artifacts.keys().cloned())
    }

    /// Write every artifact, creating parent directories as needed.
    pub fn commit(&self, store: &dyn FileStore) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in self.artifacts.values() {
            let path = self.root_dir.join(&artifact.path);
            if let Some(parent) = path.parent() {
                if !store.is_dir(parent)? {
                    store.dir_create(parent, true)?;
                }
            }
            store.file_write(&path, artifact.content.as_bytes())?;
            info!(path = %artifact.path, origin = %artifact.origin, "wrote");
            written.push(artifact.path.clone());
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_normalizes_paths_and_content() {
        let mut set = ArtifactSet::new("/root");
        set.insert("src/a.md", Path::new("docs/./guide/../a.md"), "A\n\n\n")
            .unwrap();
        set.insert("src/a.md", Path::new("/root/skills/x/SKILL.md"), "X")
            .unwrap();

        let paths: Vec<_> = set.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/a.md", "skills/x/SKILL.md"]);
        assert_eq!(set.get("docs/a.md").unwrap().content, "A\n");
    }

    #[test]
    fn test_paths_must_stay_inside_root() {
        let mut set = ArtifactSet::new("/root");
        for target in ["../escape.md", "/etc/passwd", "docs/.."] {
            let err = set.insert("src/a.md", Path::new(target), "x").unwrap_err();
            assert!(
                matches!(err, GenerateError::PathOutsideRoot { .. }),
                "{target} should be rejected"
            );
        }
    }

    #[test]
    fn test_collision_between_templates() {
        let mut set = ArtifactSet::new("/root");
        set.insert("src/a.md", Path::new("out.md"), "a").unwrap();
        set.insert("src/a.md", Path::new("out.md"), "a again").unwrap();

        let err = set.insert("src/b.md", Path::new("out.md"), "b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Output \"out.md\" is produced by both \"src/a.md\" and \"src/b.md\""
        );
    }

    #[test]
    fn test_commit_creates_directories() {
        let store = MemoryFileStore::new();
        store.dir_create(Path::new("/root"), true).unwrap();

        let mut set = ArtifactSet::new("/root");
        set.insert("src/a.md", Path::new("deep/nested/out.md"), "content")
            .unwrap();
        let written = set.commit(&store).unwrap();

        assert_eq!(written, vec!["deep/nested/out.md".to_string()]);
        assert_eq!(
            store
                .file_read_string(Path::new("/root/deep/nested/out.md"))
                .unwrap(),
            "content\n"
        );
        assert_eq!(set.manifest().files, written);
    }
}
