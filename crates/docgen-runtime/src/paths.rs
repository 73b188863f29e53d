/*
 * paths.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexical path helpers.
//!
//! These never touch the filesystem, so they behave identically for every
//! [`FileStore`](crate::FileStore) implementation.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: drop `.` components and fold `..` into the
/// preceding component.
///
/// A `..` that would climb above the start of a relative path is kept, so
/// callers can detect paths escaping their base.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().collect()
}

/// Join `relative` onto `base` and normalize the result.
///
/// A leading `/` in `relative` is treated as relative to `base`.
pub fn join_normalized(base: &Path, relative: &str) -> PathBuf {
    normalize_path(&base.join(relative.trim_start_matches('/')))
}

/// Compute the path of `target` relative to the directory `from_dir`.
///
/// Both paths are normalized first. Returns `None` when the two paths do
/// not share a root (e.g. one is relative and the other absolute).
pub fn relative_path(from_dir: &Path, target: &Path) -> Option<PathBuf> {
    let from = normalize_path(from_dir);
    let target = normalize_path(target);

    if from.has_root() != target.has_root() {
        return None;
    }

    let from_parts: Vec<_> = from.components().collect();
    let target_parts: Vec<_> = target.components().collect();
    let common = from_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from_parts.len() {
        result.push("..");
    }
    for part in &target_parts[common..] {
        result.push(part);
    }
    Some(result)
}

/// Render a relative path with forward slashes, as used in manifests and
/// markdown links.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check whether a normalized relative path stays inside its base.
pub fn is_contained(relative: &Path) -> bool {
    !relative.has_root()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        && relative.components().next().is_some()
}
