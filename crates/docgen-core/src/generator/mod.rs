/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generation orchestrator.
 */

//! The generation run.
//!
//! A run moves through five stages and never goes back:
//!
//! 1. **Discover**: every `*.md` file under the source directory, except
//!    partials (`_name.md`) and the reserved agent instruction file, is read
//!    and classified by its header block.
//! 2. **Expand**: templates are rendered from the highest priority to the
//!    lowest, the main document last, and turned into artifacts.
//! 3. **Validate**: every skill and doc reference must name something the
//!    run produced.
//! 4. **Commit**: artifacts are written.
//! 5. **Reconcile**: files listed by the previous manifest but not produced
//!    by this run are deleted, and the new manifest is saved.
//!
//! Any error before Commit leaves the previous output and manifest intact.

mod directives;
mod legacy;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use docgen_markdown::{ParsedHeaders, extract_frontmatter, header_form, parse_headers, strip_headers};
use docgen_runtime::FileStore;
use tracing::{debug, info, warn};

use crate::artifact::ArtifactSet;
use crate::collected::CollectedData;
use crate::command::{Command, CommandRegistry};
use crate::config::{Project, load_parameters};
use crate::error::{GenerateError, Result};
use crate::introspect::{Introspector, NullIntrospector};
use crate::manifest::{MANIFEST_FILE, Manifest, remove_stale};
use crate::render::{DocumentScope, Parameters, Renderer, SourcePath};
use crate::schema::{Priority, TemplateSpec, legacy_priority};

use directives::{Directives, OutputKind};

/// What a run changed on disk. Paths are relative to the root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub written: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug)]
enum TemplateKind {
    /// YAML frontmatter with `skill`/`docs`/`output`/... directives.
    Directives(TemplateSpec),
    /// `target` and `claude-command*` headers.
    Legacy(ParsedHeaders),
}

#[derive(Debug)]
struct Template {
    source: SourcePath,
    /// Content with the header block removed.
    body: String,
    priority: Priority,
    kind: TemplateKind,
}

/// Declared docs, in expansion order, with the template that declared them.
#[derive(Debug, Default)]
struct DocsIndex {
    entries: Vec<(String, String)>,
    origins: BTreeMap<String, String>,
}

impl DocsIndex {
    fn claim(&mut self, target: &str, description: &str, origin: &str) -> Result<()> {
        if let Some(first) = self.origins.get(target) {
            return Err(GenerateError::DuplicateDocs {
                target: target.to_string(),
                first: first.clone(),
                second: origin.to_string(),
            });
        }
        self.origins.insert(target.to_string(), origin.to_string());
        self.entries.push((target.to_string(), description.to_string()));
        Ok(())
    }
}

/// Expands a project's templates into artifacts.
pub struct Generator<'a> {
    store: &'a dyn FileStore,
    project: Project,
    introspector: Rc<dyn Introspector>,
    registry: CommandRegistry,
    parameters: Parameters,
}

impl<'a> Generator<'a> {
    /// A generator with the builtin commands and no class introspection.
    pub fn new(store: &'a dyn FileStore, project: Project) -> Self {
        let introspector: Rc<dyn Introspector> = Rc::new(NullIntrospector);
        Generator {
            store,
            project,
            registry: CommandRegistry::with_builtins(introspector.clone()),
            introspector,
            parameters: Parameters::new(),
        }
    }

    /// Use `introspector` for classes.
    ///
    /// Rebuilds the builtin commands, so commands registered earlier are
    /// dropped.
    pub fn with_introspector(mut self, introspector: Rc<dyn Introspector>) -> Self {
        self.registry = CommandRegistry::with_builtins(introspector.clone());
        self.introspector = introspector;
        self
    }

    /// Caller parameters; they take precedence over configured and
    /// per-directory parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Register an additional command, replacing a builtin of the same name.
    pub fn register(&mut self, command: impl Command + 'static) {
        self.registry.register(command);
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run a full generation.
    pub fn run(&self) -> Result<GenerateReport> {
        let root_dir = &self.project.root_dir;
        let source_dir = self.project.source_dir();
        if !self.store.is_dir(&source_dir)? {
            return Err(GenerateError::MissingSourceDir(source_dir));
        }

        let manifest_path = source_dir.join(MANIFEST_FILE);
        let previous = Manifest::load(self.store, &manifest_path)?;

        // Discover
        let mut templates = self.discover(&source_dir)?;
        templates.sort_by(|a, b| b.priority.cmp(&a.priority));
        info!(count = templates.len(), source = %source_dir.display(), "discovered templates");

        // Expand
        let docs_base = self.project.docs_base();
        let directives = self.directives(docs_base.as_deref());
        let known_targets: BTreeMap<PathBuf, PathBuf> = templates
            .iter()
            .filter_map(|t| {
                let target = match &t.kind {
                    TemplateKind::Legacy(headers) => legacy::first_literal_target(headers, root_dir),
                    TemplateKind::Directives(spec) => directives.primary_target(spec),
                };
                target.map(|target| (t.source.path.clone(), target))
            })
            .collect();
        let renderer = Renderer::new(&self.registry, self.store, root_dir.clone())
            .with_imports_dir(&self.project.config.imports_dir)
            .with_known_targets(known_targets);

        let mut overrides = self.project.config.parameters.clone();
        overrides.extend(self.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut artifacts = ArtifactSet::new(root_dir);
        let mut docs = DocsIndex::default();

        for template in &templates {
            debug!(template = %template.source.relative, priority = ?template.priority, "expanding");
            let dir = template.source.path.parent().unwrap_or(source_dir.as_path());
            let parameters = load_parameters(self.store, &source_dir, dir, &overrides)?;

            match &template.kind {
                TemplateKind::Directives(spec) => self.expand_directives(
                    &renderer,
                    template,
                    spec,
                    &parameters,
                    &mut artifacts,
                    &mut docs,
                )?,
                TemplateKind::Legacy(headers) => {
                    self.expand_legacy(&renderer, template, headers, &parameters, &mut artifacts)?
                }
            }
        }

        // Validate
        renderer.references().validate()?;

        let (_, imported) = renderer.finish();
        for file in imported {
            artifacts.insert(&file.origin, &file.target, &file.content)?;
        }

        // Commit
        let written = artifacts.commit(self.store)?;

        // Reconcile
        let current = artifacts.manifest();
        let stale = previous.stale(&current);
        let deleted = remove_stale(self.store, root_dir, &stale)?;
        current.save(self.store, &manifest_path)?;

        info!(written = written.len(), deleted = deleted.len(), "generation finished");
        Ok(GenerateReport { written, deleted })
    }

    fn directives<'d>(&'d self, docs_base: Option<&'d str>) -> Directives<'d> {
        Directives {
            store: self.store,
            root_dir: &self.project.root_dir,
            introspector: self.introspector.as_ref(),
            docs_base,
        }
    }

    fn discover(&self, source_dir: &Path) -> Result<Vec<Template>> {
        let reserved = self.project.config.reserved_file.as_str();
        let mut templates = Vec::new();

        for path in self.store.list_files(source_dir, "*.md")? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name == reserved || name.starts_with('_') {
                debug!(path = %path.display(), "skipping");
                continue;
            }

            let source = SourcePath::new(&path, &self.project.root_dir).ok_or_else(|| {
                GenerateError::PathOutsideRoot {
                    path: path.display().to_string(),
                    template: path.display().to_string(),
                }
            })?;
            let content = self.store.file_read_string(&path)?;
            templates.push(classify(source, &content)?);
        }

        Ok(templates)
    }

    fn expand_directives(
        &self,
        renderer: &Renderer<'_>,
        template: &Template,
        spec: &TemplateSpec,
        parameters: &Parameters,
        artifacts: &mut ArtifactSet,
        docs: &mut DocsIndex,
    ) -> Result<()> {
        let relative = template.source.relative.as_str();
        let docs_base = self.project.docs_base();
        let directives = self.directives(docs_base.as_deref());

        let collected = if spec.main {
            let collected = CollectedData::create(&docs.entries, docs_base.as_deref())
                .ok_or_else(|| GenerateError::template(relative, "Docs base path is not set, cannot list docs."))?;
            Some(collected)
        } else {
            None
        };

        let scope = DocumentScope {
            source: &template.source,
            parameters,
            collected: collected.as_ref(),
            macros_enabled: !spec.macros_disabled,
        };
        let body = renderer
            .render(
                scope,
                &template.source.path,
                &directives.reference_dir(spec),
                Some(&template.body),
            )
            .map_err(|source| GenerateError::Render {
                path: relative.to_string(),
                source,
            })?;

        let content = directives
            .content(spec, &body)
            .map_err(|message| GenerateError::template(relative, message))?;
        let outputs = directives
            .outputs(spec, &content)
            .map_err(|message| GenerateError::template(relative, message))?;

        for output in outputs {
            match &output.kind {
                OutputKind::Skill { name } => renderer.add_skill(name),
                OutputKind::Docs {
                    target,
                    description,
                } => {
                    docs.claim(target, description, relative)?;
                    renderer.add_doc(target);
                }
                OutputKind::Command | OutputKind::Output => {}
            }
            artifacts.insert(relative, &output.target, &output.content)?;
        }
        Ok(())
    }

    fn expand_legacy(
        &self,
        renderer: &Renderer<'_>,
        template: &Template,
        headers: &ParsedHeaders,
        parameters: &Parameters,
        artifacts: &mut ArtifactSet,
    ) -> Result<()> {
        let relative = template.source.relative.as_str();
        let root_dir = &self.project.root_dir;

        let targets = legacy::target_paths(self.store, root_dir, headers)
            .map_err(|message| GenerateError::template(relative, message))?;

        let claude = match self.project.claude_commands_dir() {
            Some(dir) => {
                let file_name = template
                    .source
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let commands = legacy::claude_commands(&headers.headers, &file_name)
                    .map_err(|message| GenerateError::template(relative, message))?;
                Some((dir, commands))
            }
            None => {
                if headers
                    .headers
                    .iter()
                    .any(|h| h.name.starts_with(legacy::CLAUDE_COMMAND))
                {
                    warn!(template = relative, "claude-command headers ignored: no claude-commands-dir configured");
                }
                None
            }
        };

        let target_dir = targets
            .first()
            .and_then(|t| t.parent())
            .map(Path::to_path_buf)
            .or_else(|| claude.as_ref().map(|(dir, _)| dir.clone()))
            .unwrap_or_else(|| root_dir.clone());

        let scope = DocumentScope {
            source: &template.source,
            parameters,
            collected: None,
            macros_enabled: true,
        };
        let body = renderer
            .render(scope, &template.source.path, &target_dir, Some(&template.body))
            .map_err(|source| GenerateError::Render {
                path: relative.to_string(),
                source,
            })?;

        for target in &targets {
            artifacts.insert(relative, target, &body)?;
        }
        if let Some((dir, commands)) = claude {
            for command in commands {
                let target = dir.join(command.target.trim_start_matches('/'));
                artifacts.insert(relative, &target, &command.render(&body))?;
            }
        }
        Ok(())
    }
}

/// Decide how a discovered file is generated.
fn classify(source: SourcePath, content: &str) -> Result<Template> {
    let path = || source.relative.clone();
    let frontmatter = extract_frontmatter(content);

    if let Ok(Some(fm)) = &frontmatter {
        if !fm.is_empty() && !legacy::is_legacy(fm.data.keys().map(String::as_str)) {
            let spec = TemplateSpec::from_frontmatter(&fm.data).map_err(|violations| {
                GenerateError::Schema {
                    path: path(),
                    violations,
                }
            })?;
            return Ok(Template {
                body: strip_headers(content).to_string(),
                priority: spec.priority,
                kind: TemplateKind::Directives(spec),
                source,
            });
        }
    }

    if header_form(content).is_some() {
        let headers = parse_headers(content).map_err(|e| GenerateError::Header {
            path: path(),
            source: e,
        })?;
        if legacy::is_legacy(headers.headers.iter().map(|h| h.name.as_str())) {
            let priority = match &frontmatter {
                Ok(Some(fm)) => legacy_priority(&fm.data),
                _ => Priority::default(),
            };
            return Ok(Template {
                body: headers.content.clone(),
                priority,
                kind: TemplateKind::Legacy(headers),
                source,
            });
        }
    }

    match frontmatter {
        Err(e) => Err(GenerateError::Frontmatter {
            path: path(),
            source: e,
        }),
        Ok(_) => Err(GenerateError::MissingFrontmatter { path: path() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(relative: &str) -> SourcePath {
        SourcePath::new(&Path::new("/root").join(relative), Path::new("/root")).unwrap()
    }

    #[test]
    fn test_classify_directives() {
        let template = classify(
            source("src/a.md"),
            "---\noutput:\n  target: out.md\nmetadata:\n  priority: 7\n---\n\nBody\n",
        )
        .unwrap();
        assert_eq!(template.priority, Priority::Ranked(7));
        assert_eq!(template.body, "Body\n");
        assert!(matches!(template.kind, TemplateKind::Directives(_)));
    }

    #[test]
    fn test_classify_legacy() {
        let template = classify(source("src/a.md"), "#!target: a.md\n#!target: b.md\n\nBody").unwrap();
        assert_eq!(template.priority, Priority::default());
        assert_eq!(template.body, "Body");
        let TemplateKind::Legacy(headers) = template.kind else {
            panic!("expected a legacy template");
        };
        assert_eq!(headers.named("target").count(), 2);

        let template = classify(
            source("src/b.md"),
            "---\ntarget: [\"x.md\", \"y.md\"]\nmain: true\n---\nBody",
        )
        .unwrap();
        assert_eq!(template.priority, Priority::Main);
        assert!(matches!(template.kind, TemplateKind::Legacy(_)));
    }

    #[test]
    fn test_classify_errors() {
        let err = classify(source("src/a.md"), "Just text").unwrap_err();
        assert_eq!(err.to_string(), "File \"src/a.md\" does not contain frontmatter");

        let err = classify(source("src/a.md"), "---\n---\nBody").unwrap_err();
        assert!(matches!(err, GenerateError::MissingFrontmatter { .. }));

        let err = classify(source("src/a.md"), "---\nmain: yes please\n---\nBody").unwrap_err();
        assert!(matches!(err, GenerateError::Schema { .. }));
    }

    #[test]
    fn test_docs_index_rejects_duplicates() {
        let mut docs = DocsIndex::default();
        docs.claim("a.md", "A", "src/one.md").unwrap();
        let err = docs.claim("a.md", "A again", "src/two.md").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Docs target \"a.md\" is declared by both \"src/one.md\" and \"src/two.md\""
        );
        assert_eq!(docs.entries.len(), 1);
    }
}
