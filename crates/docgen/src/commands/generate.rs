/*
 * generate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generate command implementation
 */

//! Generate command implementation.
//!
//! Discovers the project from the given (or current) directory, applies the
//! command-line overrides to its configuration and runs one generation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use docgen_core::{Generator, Parameters, Project};
use docgen_runtime::default_store;

/// Arguments for the generate command
#[derive(Debug, Default)]
pub struct GenerateArgs {
    /// Directory to start project discovery from
    pub root: Option<PathBuf>,
    /// Template directory, relative to the root
    pub source_dir: Option<String>,
    /// Base directory for docs targets
    pub docs_dir: Option<String>,
    /// Directory for legacy Claude command files
    pub claude_commands_dir: Option<String>,
    /// Template parameters (KEY=VALUE)
    pub params: Vec<String>,
    /// Suppress the summary
    pub quiet: bool,
}

/// Split `KEY=VALUE` pairs.
pub fn parse_params(params: &[String]) -> Result<Parameters> {
    let mut parsed = Parameters::new();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .with_context(|| format!("Invalid parameter \"{param}\": expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Invalid parameter \"{param}\": empty key");
        }
        parsed.insert(key.to_string(), value.to_string());
    }
    Ok(parsed)
}

/// Execute the generate command
pub fn execute(args: GenerateArgs) -> Result<()> {
    let store = default_store();

    let start = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let mut project = Project::discover(&store, &start)
        .with_context(|| format!("Failed to load project from {}", start.display()))?;
    if let Some(source_dir) = args.source_dir {
        project.config.source_dir = source_dir;
    }
    if let Some(docs_dir) = args.docs_dir {
        project.config.docs_dir = Some(docs_dir);
    }
    if let Some(dir) = args.claude_commands_dir {
        project.config.claude_commands_dir = Some(dir);
    }
    debug!(root = %project.root_dir.display(), config = ?project.config, "project");

    let parameters = parse_params(&args.params)?;
    let report = Generator::new(&store, project)
        .with_parameters(parameters)
        .run()
        .context("Generation failed")?;

    if !args.quiet {
        println!(
            "Generated {} file(s), removed {} stale file(s)",
            report.written.len(),
            report.deleted.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["name=World".to_string(), "eq=a=b".to_string()]).unwrap();
        assert_eq!(params["name"], "World");
        assert_eq!(params["eq"], "a=b");

        assert!(parse_params(&["novalue".to_string()]).is_err());
        assert!(parse_params(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_execute_with_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/a.md"), "#!target: out/a.md\n\nHi {{who}}").unwrap();

        execute(GenerateArgs {
            root: Some(root.to_path_buf()),
            source_dir: Some("templates".to_string()),
            params: vec!["who=there".to_string()],
            quiet: true,
            ..GenerateArgs::default()
        })
        .unwrap();

        assert_eq!(fs::read_to_string(root.join("out/a.md")).unwrap(), "Hi there\n");
    }
}
