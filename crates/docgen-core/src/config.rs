/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Project configuration for docgen.
 */

//! Project configuration.
//!
//! A project is either:
//! - a directory tree with a `docgen.yml` (or `docgen.yaml`) file, whose
//!   directory is the root directory
//! - any directory without one, used as the root with default settings
//!
//! Template parameters come from three layers, lowest precedence first:
//! `docs-parameters.json` files from the source directory down to the
//! template's directory, then the `parameters` configuration key, then
//! parameters given by the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use docgen_runtime::FileStore;
use docgen_runtime::paths::normalize_path;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GenerateError, Result};
use crate::render::Parameters;

/// Configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["docgen.yml", "docgen.yaml"];

/// Per-directory parameter file name.
pub const PARAMETERS_FILE: &str = "docs-parameters.json";

/// Settings read from `docgen.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Template directory, relative to the root.
    pub source_dir: String,
    /// Base directory for `docs` targets.
    pub docs_dir: Option<String>,
    /// Enables the legacy `claude-command*` headers.
    pub claude_commands_dir: Option<String>,
    /// Where `@import` renders templates that have no target of their own.
    pub imports_dir: String,
    /// Agent instruction file name that is never treated as a template.
    pub reserved_file: String,
    pub parameters: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            source_dir: "docs-src".to_string(),
            docs_dir: None,
            claude_commands_dir: None,
            imports_dir: "ai-docs/imports".to_string(),
            reserved_file: "CLAUDE.md".to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

/// A root directory with its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root_dir: PathBuf,
    /// The configuration file, when one was found.
    pub config_file: Option<PathBuf>,
    pub config: ProjectConfig,
}

impl Project {
    /// A project rooted at `root_dir` with default settings.
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Project {
            root_dir: normalize_path(root_dir.as_ref()),
            config_file: None,
            config: ProjectConfig::default(),
        }
    }

    /// Search `start` and its parents for a configuration file.
    ///
    /// Without one, `start` is the root directory.
    pub fn discover(store: &dyn FileStore, start: &Path) -> Result<Self> {
        let start = normalize_path(start);

        for dir in start.ancestors() {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if store.is_file(&candidate)? {
                    debug!(config = %candidate.display(), "found project configuration");
                    return Self::load(store, &candidate);
                }
            }
        }

        debug!(root = %start.display(), "no project configuration, using defaults");
        Ok(Self::new(start))
    }

    /// Load a specific configuration file.
    pub fn load(store: &dyn FileStore, config_file: &Path) -> Result<Self> {
        let config_error = |message: String| GenerateError::Config {
            path: config_file.to_path_buf(),
            message,
        };

        let content = store.file_read_string(config_file)?;
        let config: ProjectConfig = if content.trim().is_empty() {
            ProjectConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?
        };

        let root_dir = config_file
            .parent()
            .map(normalize_path)
            .ok_or_else(|| config_error("configuration file has no parent directory".into()))?;

        Ok(Project {
            root_dir,
            config_file: Some(config_file.to_path_buf()),
            config,
        })
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.source_dir)
    }

    pub fn claude_commands_dir(&self) -> Option<PathBuf> {
        self.config.claude_commands_dir.as_deref().map(|d| self.resolve(d))
    }

    /// Resolve a configured directory against the root.
    ///
    /// Absolute paths are kept as they are.
    pub fn resolve(&self, dir: &str) -> PathBuf {
        normalize_path(&self.root_dir.join(dir))
    }

    /// Docs base path relative to the root, if configured.
    pub fn docs_base(&self) -> Option<String> {
        let docs_dir = self.config.docs_dir.as_deref()?;
        let absolute = self.resolve(docs_dir);
        let relative = absolute.strip_prefix(&self.root_dir).ok()?;
        Some(docgen_runtime::paths::to_slash(relative))
    }
}

/// Read one `docs-parameters.json` file, if present.
fn read_parameters_file(store: &dyn FileStore, path: &Path) -> Result<Option<Parameters>> {
    if !store.is_file(path)? {
        return Ok(None);
    }
    let content = store.file_read_string(path)?;
    let parameters: Parameters =
        serde_json::from_str(&content).map_err(|e| GenerateError::Parameters {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(Some(parameters))
}

/// Parameters for templates in `dir`.
///
/// Parameter files are merged from `source_dir` down to `dir`, deeper files
/// overriding shallower ones; `overrides` win over all of them.
pub fn load_parameters(
    store: &dyn FileStore,
    source_dir: &Path,
    dir: &Path,
    overrides: &Parameters,
) -> Result<Parameters> {
    let mut chain: Vec<&Path> = dir
        .ancestors()
        .take_while(|d| d.starts_with(source_dir))
        .collect();
    chain.reverse();

    let mut parameters = Parameters::new();
    for d in chain {
        if let Some(file) = read_parameters_file(store, &d.join(PARAMETERS_FILE))? {
            debug!(dir = %d.display(), count = file.len(), "loaded template parameters");
            parameters.extend(file);
        }
    }
    parameters.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_walks_upward() {
        let store = MemoryFileStore::new()
            .with_file(
                "/work/docgen.yaml",
                "source-dir: templates\ndocs-dir: docs\nparameters:\n  name: World\n",
            )
            .with_file("/work/templates/a/b.md", "");

        let project = Project::discover(&store, Path::new("/work/templates/a")).unwrap();
        assert_eq!(project.root_dir, PathBuf::from("/work"));
        assert_eq!(project.config_file, Some(PathBuf::from("/work/docgen.yaml")));
        assert_eq!(project.source_dir(), PathBuf::from("/work/templates"));
        assert_eq!(project.docs_base(), Some("docs".to_string()));
        assert_eq!(project.config.imports_dir, "ai-docs/imports");
        assert_eq!(project.config.parameters["name"], "World");
    }

    #[test]
    fn test_discover_without_config() {
        let store = MemoryFileStore::new().with_file("/work/docs-src/a.md", "");
        let project = Project::discover(&store, Path::new("/work")).unwrap();
        assert_eq!(project, Project::new("/work"));
        assert_eq!(project.source_dir(), PathBuf::from("/work/docs-src"));
        assert_eq!(project.docs_base(), None);
    }

    #[test]
    fn test_unknown_config_key() {
        let store = MemoryFileStore::new().with_file("/work/docgen.yml", "sources: x\n");
        let err = Project::discover(&store, Path::new("/work")).unwrap_err();
        assert!(matches!(err, GenerateError::Config { .. }));
    }

    #[test]
    fn test_parameter_layers() {
        let store = MemoryFileStore::new()
            .with_file(
                "/work/src/docs-parameters.json",
                r#"{"a": "root", "b": "root", "c": "root"}"#,
            )
            .with_file("/work/src/guide/docs-parameters.json", r#"{"b": "guide"}"#)
            .with_file("/work/docs-parameters.json", r#"{"d": "outside"}"#);

        let overrides = Parameters::from([("c".to_string(), "caller".to_string())]);
        let parameters = load_parameters(
            &store,
            Path::new("/work/src"),
            Path::new("/work/src/guide"),
            &overrides,
        )
        .unwrap();

        assert_eq!(
            parameters,
            Parameters::from([
                ("a".to_string(), "root".to_string()),
                ("b".to_string(), "guide".to_string()),
                ("c".to_string(), "caller".to_string()),
            ])
        );
    }

    #[test]
    fn test_invalid_parameters_file() {
        let store = MemoryFileStore::new().with_file("/work/src/docs-parameters.json", r#"{"a": 1}"#);
        let err = load_parameters(
            &store,
            Path::new("/work/src"),
            Path::new("/work/src"),
            &Parameters::new(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid parameters file"));
    }
}
