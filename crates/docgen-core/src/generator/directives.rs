/*
 * directives.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Frontmatter directives: appended sections and output targets.
 */

//! Turn an expanded template body into the files its frontmatter declares.

use std::path::{Path, PathBuf};

use docgen_markdown::dump_frontmatter;
use docgen_runtime::FileStore;
use docgen_runtime::paths::{join_normalized, normalize_path};
use serde::Serialize;

use crate::introspect::{Introspector, SignatureOptions};
use crate::schema::{ApiEntry, ExampleEntry, ExampleSource, TemplateSpec};

/// Message of a directive that cannot be fulfilled.
pub(crate) type DirectiveResult<T> = std::result::Result<T, String>;

/// What a directive produces besides file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputKind {
    Skill { name: String },
    Command,
    Output,
    Docs { target: String, description: String },
}

/// One file declared by a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Output {
    /// Relative to the root directory.
    pub target: PathBuf,
    pub content: String,
    pub kind: OutputKind,
}

pub(crate) struct Directives<'a> {
    pub store: &'a dyn FileStore,
    pub root_dir: &'a Path,
    pub introspector: &'a dyn Introspector,
    pub docs_base: Option<&'a str>,
}

#[derive(Serialize)]
struct SkillHeader<'a> {
    name: &'a str,
    description: &'a str,
}

fn fence(language: &str, code: &str) -> String {
    let mut ticks = "```".to_string();
    while code.contains(&ticks) {
        ticks.push('`');
    }
    format!("{ticks}{language}\n{}\n{ticks}", code.trim())
}

fn example_language(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "php" => "php",
        "js" => "javascript",
        "ts" => "typescript",
        "md" => "markdown",
        "tsp" => "typespec",
        "rs" => "rust",
        "py" => "python",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "sh" => "bash",
        _ => return None,
    })
}

fn check_contains(content: &str, required: &[String], what: &str) -> DirectiveResult<()> {
    match required.iter().find(|s| !content.contains(s.as_str())) {
        Some(missing) => Err(format!(
            "Example for {what} does not contain required string \"{missing}\"."
        )),
        None => Ok(()),
    }
}

impl Directives<'_> {
    /// Expanded body plus the `api` and `examples` sections.
    pub fn content(&self, spec: &TemplateSpec, body: &str) -> DirectiveResult<String> {
        let mut content = body.trim().to_string();
        if !spec.api.is_empty() {
            content = format!("{content}{}", self.api(&spec.api)?).trim().to_string();
        }
        if !spec.examples.is_empty() {
            content = format!("{content}{}", self.examples(&spec.examples)?).trim().to_string();
        }
        Ok(content)
    }

    fn api(&self, entries: &[ApiEntry]) -> DirectiveResult<String> {
        let mut blocks = Vec::with_capacity(entries.len());
        for entry in entries {
            let signature = self
                .introspector
                .class_signature(&entry.class, &SignatureOptions::with_visibility(entry.visibility))
                .map_err(|e| e.to_string())?;
            blocks.push(fence(self.introspector.language(), &signature));
        }

        Ok(format!(
            "\n\n## Api Reference\n\nThe following short code snippets demonstrate the API:\n\n{}",
            blocks.join("\n\n")
        ))
    }

    fn examples(&self, entries: &[ExampleEntry]) -> DirectiveResult<String> {
        let heading = if entries.len() == 1 { "Example" } else { "Examples" };

        let mut blocks = Vec::with_capacity(entries.len());
        for entry in entries {
            let block = match &entry.source {
                ExampleSource::Class(class) => {
                    let path = self.introspector.class_source_file(class).map_err(|e| e.to_string())?;
                    let source = self
                        .store
                        .file_read_string(&path)
                        .map_err(|_| format!("Unable to read file for class \"{class}\"."))?;
                    check_contains(&source, &entry.contains, &format!("class \"{class}\""))?;
                    fence(self.introspector.language(), &source)
                }
                ExampleSource::File(file) => {
                    let path = join_normalized(self.root_dir, file);
                    let unreadable = || format!("Example file \"{file}\" does not exist or is not readable.");
                    if !self.store.is_file(&path).map_err(|_| unreadable())? {
                        return Err(unreadable());
                    }
                    let source = self.store.file_read_string(&path).map_err(|_| unreadable())?;

                    let extension = path
                        .extension()
                        .map(|e| e.to_string_lossy().to_lowercase())
                        .unwrap_or_default();
                    let language = example_language(&extension)
                        .ok_or_else(|| format!("Unsupported example file extension \"{extension}\"."))?;
                    check_contains(&source, &entry.contains, &format!("file \"{file}\""))?;
                    fence(language, &source)
                }
            };
            blocks.push(block);
        }

        Ok(format!("\n\n## {heading}\n\n{}", blocks.join("\n\n")))
    }

    /// Files declared by `skill`, `commands`, `output` and `docs`, in that
    /// order.
    pub fn outputs(&self, spec: &TemplateSpec, content: &str) -> DirectiveResult<Vec<Output>> {
        let mut outputs = Vec::new();

        if let Some(skill) = &spec.skill {
            let target = skill.target.trim_matches('/');
            let name = target.rsplit('/').next().unwrap_or_default();
            if name.is_empty() {
                return Err("Skill target must not be empty.".to_string());
            }
            let header = dump_frontmatter(&SkillHeader {
                name: &skill.name,
                description: &skill.description,
            })
            .map_err(|e| e.to_string())?;

            outputs.push(Output {
                target: Path::new(target).join("SKILL.md"),
                content: format!("{header}{content}"),
                kind: OutputKind::Skill {
                    name: name.to_string(),
                },
            });
        }

        for command in &spec.commands {
            if !command.prompt.contains("$ARGUMENTS") {
                return Err("Command prompt must contain \"$ARGUMENTS\" placeholder.".to_string());
            }
            outputs.push(Output {
                target: PathBuf::from(format!(".claude/commands/{}.md", command.name)),
                content: format!("{content}\n\n{}", command.prompt),
                kind: OutputKind::Command,
            });
        }

        if let Some(output) = &spec.output {
            if !output.target.ends_with(".md") {
                return Err("Output target must be a markdown file with \".md\" extension.".to_string());
            }
            outputs.push(Output {
                target: PathBuf::from(output.target.trim_start_matches('/')),
                content: content.to_string(),
                kind: OutputKind::Output,
            });
        }

        if let Some(docs) = &spec.docs {
            if !docs.target.ends_with(".md") {
                return Err("Docs target must be a markdown file with \".md\" extension.".to_string());
            }
            let Some(base) = self.docs_base else {
                return Err("Docs base path is not set, cannot create docs.".to_string());
            };
            outputs.push(Output {
                target: Path::new(base.trim_matches('/')).join(docs.target.trim_start_matches('/')),
                content: content.to_string(),
                kind: OutputKind::Docs {
                    target: docs.target.clone(),
                    description: docs.description.clone(),
                },
            });
        }

        Ok(outputs)
    }

    /// Absolute path of the first file the template declares, if any.
    pub fn primary_target(&self, spec: &TemplateSpec) -> Option<PathBuf> {
        let first = if let Some(skill) = &spec.skill {
            Path::new(skill.target.trim_matches('/')).join("SKILL.md")
        } else if let Some(command) = spec.commands.first() {
            PathBuf::from(format!(".claude/commands/{}.md", command.name))
        } else if let Some(output) = &spec.output {
            PathBuf::from(output.target.trim_start_matches('/'))
        } else if let (Some(docs), Some(base)) = (&spec.docs, self.docs_base) {
            Path::new(base.trim_matches('/')).join(docs.target.trim_start_matches('/'))
        } else {
            return None;
        };
        Some(normalize_path(&self.root_dir.join(first)))
    }

    /// Directory the template's relative references are computed against:
    /// the first declared output's directory, or the root.
    pub fn reference_dir(&self, spec: &TemplateSpec) -> PathBuf {
        self.primary_target(spec)
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| self.root_dir.to_path_buf(), Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{StaticIntrospector, VisibilityMask};
    use crate::schema::{CommandDirective, DocsDirective, OutputDirective, SkillDirective};
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    fn introspector() -> StaticIntrospector {
        StaticIntrospector::new("php")
            .with_class(
                "App\\Mailer",
                "final class Mailer\n{\n}\n",
                Some(PathBuf::from("/root/src/Mailer.php")),
            )
    }

    #[test]
    fn test_api_and_examples_sections() {
        let store = MemoryFileStore::new()
            .with_file("/root/src/Mailer.php", "<?php\nfinal class Mailer {}\n")
            .with_file("/root/demo/send.ts", "mailer.send(\"```\");\n");
        let introspector = introspector();
        let directives = Directives {
            store: &store,
            root_dir: Path::new("/root"),
            introspector: &introspector,
            docs_base: None,
        };
        let spec = TemplateSpec {
            api: vec![ApiEntry {
                class: "App\\Mailer".into(),
                visibility: VisibilityMask::PUBLIC,
            }],
            examples: vec![
                ExampleEntry {
                    source: ExampleSource::Class("App\\Mailer".into()),
                    contains: vec!["final class".into()],
                },
                ExampleEntry {
                    source: ExampleSource::File("demo/send.ts".into()),
                    contains: Vec::new(),
                },
            ],
            ..TemplateSpec::default()
        };

        let content = directives.content(&spec, "\nBody\n").unwrap();
        assert_eq!(
            content,
            "Body\n\n## Api Reference\n\nThe following short code snippets demonstrate the API:\n\n\
             ```php\nfinal class Mailer\n{\n}\n```\n\n\
             ## Examples\n\n\
             ```php\n<?php\nfinal class Mailer {}\n```\n\n\
             ````typescript\nmailer.send(\"```\");\n````"
        );
    }

    #[test]
    fn test_example_failures() {
        let store = MemoryFileStore::new()
            .with_file("/root/src/Mailer.php", "<?php\nfinal class Mailer {}\n")
            .with_file("/root/demo/send.rb", "send");
        let introspector = introspector();
        let directives = Directives {
            store: &store,
            root_dir: Path::new("/root"),
            introspector: &introspector,
            docs_base: None,
        };
        let example = |source: ExampleSource, contains: Vec<String>| TemplateSpec {
            examples: vec![ExampleEntry { source, contains }],
            ..TemplateSpec::default()
        };

        let err = directives
            .content(&example(ExampleSource::Class("App\\Mailer".into()), vec!["send(".into()]), "")
            .unwrap_err();
        assert_eq!(
            err,
            "Example for class \"App\\Mailer\" does not contain required string \"send(\"."
        );

        let err = directives
            .content(&example(ExampleSource::File("demo/send.rb".into()), Vec::new()), "")
            .unwrap_err();
        assert_eq!(err, "Unsupported example file extension \"rb\".");

        let err = directives
            .content(&example(ExampleSource::File("demo/none.php".into()), Vec::new()), "")
            .unwrap_err();
        assert_eq!(err, "Example file \"demo/none.php\" does not exist or is not readable.");
    }

    #[test]
    fn test_outputs() {
        let store = MemoryFileStore::new();
        let introspector = introspector();
        let directives = Directives {
            store: &store,
            root_dir: Path::new("/root"),
            introspector: &introspector,
            docs_base: Some("docs"),
        };
        let spec = TemplateSpec {
            skill: Some(SkillDirective {
                target: "skills/mail/".into(),
                name: "Mail".into(),
                description: "Sending mail".into(),
            }),
            commands: vec![CommandDirective {
                name: "send".into(),
                prompt: "Send $ARGUMENTS".into(),
            }],
            output: Some(OutputDirective {
                target: "MAIL.md".into(),
            }),
            docs: Some(DocsDirective {
                target: "/guide/mail.md".into(),
                description: "Mail guide".into(),
            }),
            ..TemplateSpec::default()
        };

        let outputs = directives.outputs(&spec, "Body").unwrap();
        let targets: Vec<_> = outputs.iter().map(|o| o.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                PathBuf::from("skills/mail/SKILL.md"),
                PathBuf::from(".claude/commands/send.md"),
                PathBuf::from("MAIL.md"),
                PathBuf::from("docs/guide/mail.md"),
            ]
        );
        assert_eq!(
            outputs[0].content,
            "---\nname: Mail\ndescription: Sending mail\n---\n\nBody"
        );
        assert_eq!(
            outputs[0].kind,
            OutputKind::Skill {
                name: "mail".into()
            }
        );
        assert_eq!(outputs[1].content, "Body\n\nSend $ARGUMENTS");
        assert_eq!(
            directives.reference_dir(&spec),
            PathBuf::from("/root/skills/mail")
        );
        assert_eq!(
            directives.primary_target(&spec),
            Some(PathBuf::from("/root/skills/mail/SKILL.md"))
        );
    }

    #[test]
    fn test_output_rules() {
        let store = MemoryFileStore::new();
        let introspector = introspector();
        let directives = Directives {
            store: &store,
            root_dir: Path::new("/root"),
            introspector: &introspector,
            docs_base: None,
        };

        let bad_prompt = TemplateSpec {
            commands: vec![CommandDirective {
                name: "x".into(),
                prompt: "no placeholder".into(),
            }],
            ..TemplateSpec::default()
        };
        assert_eq!(
            directives.outputs(&bad_prompt, "").unwrap_err(),
            "Command prompt must contain \"$ARGUMENTS\" placeholder."
        );

        let not_markdown = TemplateSpec {
            output: Some(OutputDirective {
                target: "out.txt".into(),
            }),
            ..TemplateSpec::default()
        };
        assert_eq!(
            directives.outputs(&not_markdown, "").unwrap_err(),
            "Output target must be a markdown file with \".md\" extension."
        );

        let no_base = TemplateSpec {
            docs: Some(DocsDirective {
                target: "a.md".into(),
                description: "A".into(),
            }),
            ..TemplateSpec::default()
        };
        assert_eq!(
            directives.outputs(&no_base, "").unwrap_err(),
            "Docs base path is not set, cannot create docs."
        );
        assert_eq!(directives.reference_dir(&no_base), PathBuf::from("/root"));
        assert_eq!(directives.primary_target(&no_base), None);
    }
}
