/*
 * legacy.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Header-driven fan-out for templates using `target` and
 * `claude-command*` headers.
 */

//! Legacy multi-target templates.
//!
//! Such a template is rendered once; the body is then written to every
//! `target` header (a single `*` segment expands to every existing
//! directory at that position) and to every Claude command the
//! `claude-command*` headers declare.

use std::path::{Path, PathBuf};

use docgen_markdown::{Header, ParsedHeaders};
use docgen_runtime::FileStore;
use docgen_runtime::paths::{join_normalized, normalize_path};
use tracing::warn;

use super::directives::DirectiveResult;

pub(crate) const TARGET: &str = "target";
pub(crate) const CLAUDE_COMMAND: &str = "claude-command";
pub(crate) const CLAUDE_COMMAND_TARGET: &str = "claude-command-target";
pub(crate) const CLAUDE_COMMAND_PROMPT: &str = "claude-command-prompt";

/// Whether the headers select the legacy fan-out.
pub(crate) fn is_legacy<'h>(mut names: impl Iterator<Item = &'h str>) -> bool {
    names.any(|name| name == TARGET || name.starts_with(CLAUDE_COMMAND))
}

/// The first `target` header without a glob, as an absolute path.
pub(crate) fn first_literal_target(headers: &ParsedHeaders, root_dir: &Path) -> Option<PathBuf> {
    let target = headers.first(TARGET)?;
    if target.value.contains('*') {
        return None;
    }
    Some(join_normalized(root_dir, &target.value))
}

/// Absolute paths of every `target` header, in header order.
pub(crate) fn target_paths(
    store: &dyn FileStore,
    root_dir: &Path,
    headers: &ParsedHeaders,
) -> DirectiveResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for header in headers.named(TARGET) {
        let value = header.value.trim_start_matches('/');
        match value.rfind('*') {
            None => paths.push(normalize_path(&root_dir.join(value))),
            Some(star) => paths.extend(expand_glob(store, root_dir, value, star)?),
        }
    }
    Ok(paths)
}

fn expand_glob(
    store: &dyn FileStore,
    root_dir: &Path,
    pattern: &str,
    star: usize,
) -> DirectiveResult<Vec<PathBuf>> {
    let (prefix, suffix) = (&pattern[..star], &pattern[star + 1..]);
    let dir = normalize_path(&root_dir.join(prefix));

    if !store.is_dir(&dir).map_err(|e| e.to_string())? {
        warn!(pattern, dir = %dir.display(), "target pattern matches no directory");
        return Ok(Vec::new());
    }

    let dirs = store
        .list_directories(&dir, "*")
        .map_err(|e| e.to_string())?;
    Ok(dirs
        .into_iter()
        .map(|d| normalize_path(&PathBuf::from(format!("{}{suffix}", d.display()))))
        .collect())
}

/// A Claude command file to write: target relative to the commands
/// directory, and the prompt to prepend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClaudeCommand {
    pub target: String,
    pub prompt: String,
}

impl ClaudeCommand {
    pub fn render(&self, body: &str) -> String {
        format!("{}\n", format!("{}\n\n{body}", self.prompt).trim())
    }
}

/// Collect the Claude commands declared by the headers.
///
/// `file_name` is the target when only a prompt is declared.
pub(crate) fn claude_commands(headers: &[Header], file_name: &str) -> DirectiveResult<Vec<ClaudeCommand>> {
    let mut commands = Vec::new();
    let mut targets = Vec::new();
    let mut prompts = Vec::new();

    for header in headers {
        match header.name.as_str() {
            CLAUDE_COMMAND_TARGET => targets.push(header.value.clone()),
            CLAUDE_COMMAND_PROMPT => prompts.push(header.value.clone()),
            CLAUDE_COMMAND => {
                let Some((target, prompt)) = header.value.split_once("--") else {
                    return Err(format!(
                        "Invalid claude-command header \"{}\". It must contain a prompt after \"--\".",
                        header.value
                    ));
                };
                commands.push(ClaudeCommand {
                    target: target.trim().to_string(),
                    prompt: prompt.trim().to_string(),
                });
            }
            _ => {}
        }
    }

    if prompts.len() > 1 {
        return Err("Multiple claude-command-prompt headers found. Only one is allowed.".to_string());
    }

    match prompts.pop() {
        None if !targets.is_empty() => Err(
            "claude-command-prompt header is required when claude-command-target headers are present."
                .to_string(),
        ),
        None => Ok(commands),
        Some(prompt) if targets.is_empty() => {
            commands.push(ClaudeCommand {
                target: file_name.to_string(),
                prompt,
            });
            Ok(commands)
        }
        Some(prompt) => {
            commands.extend(targets.into_iter().map(|target| ClaudeCommand {
                target,
                prompt: prompt.clone(),
            }));
            Ok(commands)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_markdown::parse_headers;
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    fn header(name: &str, value: &str) -> Header {
        Header::new(name, value)
    }

    #[test]
    fn test_target_paths_with_glob() {
        let store = MemoryFileStore::new()
            .with_file("/root/modules/auth/src/lib.php", "")
            .with_file("/root/modules/mail/src/lib.php", "")
            .with_file("/root/modules/README.md", "");
        let headers = parse_headers("#!target: /AGENTS.md\n#!target: modules/*/CLAUDE.md\n\nBody").unwrap();

        let paths = target_paths(&store, Path::new("/root"), &headers).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/root/AGENTS.md"),
                PathBuf::from("/root/modules/auth/CLAUDE.md"),
                PathBuf::from("/root/modules/mail/CLAUDE.md"),
            ]
        );
        assert_eq!(
            first_literal_target(&headers, Path::new("/root")),
            Some(PathBuf::from("/root/AGENTS.md"))
        );
    }

    #[test]
    fn test_glob_without_directory_is_empty() {
        let store = MemoryFileStore::new();
        let headers = parse_headers("#!target: missing/*/x.md\n\nBody").unwrap();
        assert!(target_paths(&store, Path::new("/root"), &headers).unwrap().is_empty());
        assert_eq!(first_literal_target(&headers, Path::new("/root")), None);
    }

    #[test]
    fn test_claude_command_forms() {
        let headers = vec![
            header("claude-command", "review.md -- Review the code"),
            header("claude-command-target", "a.md"),
            header("claude-command-target", "b.md"),
            header("claude-command-prompt", "Do it"),
        ];
        let commands = claude_commands(&headers, "tpl.md").unwrap();
        let targets: Vec<_> = commands.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(targets, vec!["review.md", "a.md", "b.md"]);
        assert_eq!(commands[0].prompt, "Review the code");
        assert_eq!(commands[2].render("\nBody\n"), "Do it\n\n\nBody\n");

        let only_prompt = vec![header("claude-command-prompt", "Prompt")];
        let commands = claude_commands(&only_prompt, "tpl.md").unwrap();
        assert_eq!(commands[0].target, "tpl.md");
    }

    #[test]
    fn test_claude_command_errors() {
        let err = claude_commands(&[header("claude-command", "x.md")], "t.md").unwrap_err();
        assert!(err.contains("must contain a prompt after \"--\""));

        let err = claude_commands(
            &[header("claude-command-prompt", "a"), header("claude-command-prompt", "b")],
            "t.md",
        )
        .unwrap_err();
        assert!(err.starts_with("Multiple claude-command-prompt headers"));

        let err = claude_commands(&[header("claude-command-target", "a.md")], "t.md").unwrap_err();
        assert!(err.starts_with("claude-command-prompt header is required"));
    }

    #[test]
    fn test_is_legacy() {
        assert!(is_legacy(["title", "target"].into_iter()));
        assert!(is_legacy(["claude-command-prompt"].into_iter()));
        assert!(!is_legacy(["skill", "docs"].into_iter()));
    }
}
