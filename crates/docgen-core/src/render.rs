/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Recursive template rendering.
 */

//! The rendering engine.
//!
//! [`Renderer::render`] turns one template into fully expanded text:
//!
//! 1. File bodies are memoized per resolved path, so a file included from
//!    many places is read once per run. Expansion always runs again, under
//!    the parameters and target of whoever asked for it.
//! 2. A path that is already being rendered further up the stack is a
//!    circular inclusion.
//! 3. Variables are substituted first, then snippets are dispatched to the
//!    [`CommandRegistry`]. Both passes splice replacements into a fresh
//!    buffer, visiting spans from the highest offset to the lowest.
//! 4. For whole documents, every command's `after` runs, then every
//!    command's `reset`. Included fragments contribute to the document
//!    that includes them instead.
//!
//! The renderer also owns the run-scoped state commands share: the
//! [`ReferenceChecker`] and the files produced by `@import`.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use docgen_markdown::{parse_snippets, parse_variables, splice, strip_headers};
use docgen_runtime::FileStore;
use docgen_runtime::paths::{join_normalized, normalize_path, relative_path, to_slash};
use tracing::debug;

use crate::collected::CollectedData;
use crate::command::CommandRegistry;
use crate::error::{MacroError, RenderError};
use crate::reference::ReferenceChecker;

/// Values available to `{{name}}` variables.
pub type Parameters = BTreeMap<String, String>;

/// Whether a render produces a whole document or a piece of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Runs the `after`/`reset` hooks of every command.
    Document,
    /// Spliced into the document that requested it.
    Fragment,
}

/// A template file, absolute and relative to the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    pub path: PathBuf,
    pub relative: String,
}

impl SourcePath {
    /// Returns `None` when `path` is not strictly inside `root`.
    pub fn new(path: &Path, root: &Path) -> Option<Self> {
        let path = normalize_path(path);
        let relative = path.strip_prefix(normalize_path(root)).ok()?;
        let relative = to_slash(relative);
        if relative.is_empty() {
            return None;
        }
        Some(SourcePath { path, relative })
    }
}

/// Per-template inputs shared by every nested render of that template.
#[derive(Debug, Clone, Copy)]
pub struct DocumentScope<'a> {
    pub source: &'a SourcePath,
    pub parameters: &'a Parameters,
    /// Present only while the main document is rendered.
    pub collected: Option<&'a CollectedData>,
    pub macros_enabled: bool,
}

/// A file rendered by `@import`, to be written as part of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub target: PathBuf,
    pub content: String,
    /// Template (relative path) whose render first imported the file.
    pub origin: String,
}

#[derive(Debug, Default)]
struct Imports {
    /// Template path to the path its rendered output lives at.
    targets: BTreeMap<PathBuf, PathBuf>,
    rendered: Vec<ImportedFile>,
}

impl Imports {
    fn free_target(&self, imports_dir: &Path, source: &Path) -> PathBuf {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = source.extension().map(|e| e.to_string_lossy().into_owned());

        let taken = |candidate: &Path| self.targets.values().any(|t| t == candidate);

        let mut candidate = imports_dir.join(&file_name);
        let mut i = 0;
        while taken(&candidate) {
            i += 1;
            let name = match &extension {
                Some(ext) => format!("{stem}-{i}.{ext}"),
                None => format!("{stem}-{i}"),
            };
            candidate = imports_dir.join(name);
        }
        candidate
    }
}

/// Recursive template renderer for one generation run.
pub struct Renderer<'a> {
    registry: &'a CommandRegistry,
    store: &'a dyn FileStore,
    root_dir: PathBuf,
    imports_dir: PathBuf,
    /// Template bodies by path; expansion itself depends on the caller.
    sources: RefCell<HashMap<PathBuf, Rc<str>>>,
    processing: RefCell<Vec<PathBuf>>,
    references: RefCell<ReferenceChecker>,
    imports: RefCell<Imports>,
}

impl<'a> Renderer<'a> {
    pub fn new(
        registry: &'a CommandRegistry,
        store: &'a dyn FileStore,
        root_dir: impl Into<PathBuf>,
    ) -> Self {
        let root_dir = normalize_path(&root_dir.into());
        Renderer {
            registry,
            store,
            imports_dir: root_dir.join("ai-docs/imports"),
            root_dir,
            sources: RefCell::new(HashMap::new()),
            processing: RefCell::new(Vec::new()),
            references: RefCell::new(ReferenceChecker::new()),
            imports: RefCell::new(Imports::default()),
        }
    }

    /// Directory (relative to the root) that `@import` renders into.
    pub fn with_imports_dir(mut self, dir: &str) -> Self {
        self.imports_dir = join_normalized(&self.root_dir, dir);
        self
    }

    /// Templates whose output path is already known. `@import` of such a
    /// template references that path instead of rendering a copy.
    pub fn with_known_targets(self, targets: BTreeMap<PathBuf, PathBuf>) -> Self {
        self.imports.borrow_mut().targets = targets
            .into_iter()
            .map(|(source, target)| (normalize_path(&source), normalize_path(&target)))
            .collect();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn store(&self) -> &'a dyn FileStore {
        self.store
    }

    pub fn references(&self) -> Ref<'_, ReferenceChecker> {
        self.references.borrow()
    }

    /// Register a produced skill name.
    pub fn add_skill(&self, name: &str) {
        self.references.borrow_mut().add_skill(name);
    }

    /// Register a produced doc name.
    pub fn add_doc(&self, name: &str) {
        self.references.borrow_mut().add_doc(name);
    }

    /// Consume the renderer, returning the reference registry and every
    /// file rendered by `@import`.
    pub fn finish(self) -> (ReferenceChecker, Vec<ImportedFile>) {
        (
            self.references.into_inner(),
            self.imports.into_inner().rendered,
        )
    }

    /// Render a whole document.
    ///
    /// `content` replaces the file's contents when the caller already split
    /// off the header block; otherwise the file is read and its headers are
    /// stripped. Relative references in the output are computed against
    /// `target_dir`.
    pub fn render(
        &self,
        scope: DocumentScope<'_>,
        path: &Path,
        target_dir: &Path,
        content: Option<&str>,
    ) -> Result<String, RenderError> {
        self.render_with_mode(scope, path, target_dir, content, RenderMode::Document)
    }

    fn render_with_mode(
        &self,
        scope: DocumentScope<'_>,
        path: &Path,
        target_dir: &Path,
        content: Option<&str>,
        mode: RenderMode,
    ) -> Result<String, RenderError> {
        let path = normalize_path(path);
        let _guard = ProcessingGuard::enter(&self.processing, &path)?;
        debug!(path = %path.display(), ?mode, "rendering");

        let ctx = RenderContext {
            renderer: self,
            working_dir: path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root_dir.clone()),
            target_dir: normalize_path(target_dir),
            scope,
        };

        let source;
        let body = match content {
            Some(content) => content,
            None => {
                source = self.source(&path)?;
                &*source
            }
        };

        let expanded = match mode {
            RenderMode::Document => {
                self.registry.begin_document();
                let result = self
                    .expand(&ctx, &path, body)
                    .map(|content| self.registry.after_document(content));
                self.registry.reset_document();
                result
            }
            RenderMode::Fragment => self.expand(&ctx, &path, body),
        };

        Ok(expanded?.trim().to_string())
    }

    /// Body of `path` with its header block removed, read once per run.
    fn source(&self, path: &Path) -> Result<Rc<str>, RenderError> {
        if let Some(body) = self.sources.borrow().get(path) {
            debug!(path = %path.display(), "source cache hit");
            return Ok(body.clone());
        }

        let raw = self.store.file_read_string(path)?;
        let body: Rc<str> = Rc::from(strip_headers(&raw));
        self.sources
            .borrow_mut()
            .insert(path.to_path_buf(), body.clone());
        Ok(body)
    }

    fn expand(
        &self,
        ctx: &RenderContext<'_>,
        path: &Path,
        body: &str,
    ) -> Result<String, RenderError> {
        let variables = parse_variables(body);
        let text = splice(body, &variables, |variable| {
            if let Some(value) = ctx.scope.parameters.get(&variable.name) {
                return Ok(Some(value.clone()));
            }
            // `{{docs-list}}` and friends are argument-less snippets.
            if self.registry.contains(&variable.name) {
                return Ok(None);
            }
            Err(RenderError::UnresolvedVariable {
                path: path.to_path_buf(),
                name: variable.name.clone(),
            })
        })?;

        if !ctx.scope.macros_enabled {
            return Ok(text);
        }

        let snippets = parse_snippets(&text);
        splice(&text, &snippets, |snippet| {
            let Some(command) = self.registry.get(&snippet.name) else {
                return Ok(None);
            };
            command
                .invoke(ctx, &snippet.arguments)
                .map(Some)
                .map_err(|source| RenderError::Macro {
                    path: path.to_path_buf(),
                    command: snippet.name.clone(),
                    source,
                })
        })
    }

    fn import(&self, ctx: &RenderContext<'_>, reference: &str) -> Result<String, MacroError> {
        let source = ctx.resolve_path(reference);
        if !self.store.is_file(&source)? {
            return Err(MacroError::MissingFile(source));
        }

        let known = self.imports.borrow().targets.get(&source).cloned();
        let target = match known {
            Some(target) => target,
            None => {
                let target = self.imports.borrow().free_target(&self.imports_dir, &source);
                self.imports
                    .borrow_mut()
                    .targets
                    .insert(source.clone(), target.clone());

                let content = self.render_with_mode(
                    ctx.scope,
                    &source,
                    &self.imports_dir,
                    None,
                    RenderMode::Document,
                )?;
                debug!(source = %source.display(), target = %target.display(), "imported");

                self.imports.borrow_mut().rendered.push(ImportedFile {
                    target: target.clone(),
                    content,
                    origin: ctx.scope.source.relative.clone(),
                });
                target
            }
        };

        Ok(format!("@{}", ctx.relative_to_target(&target)))
    }
}

/// Marks a path as being rendered for as long as the guard lives.
struct ProcessingGuard<'a> {
    stack: &'a RefCell<Vec<PathBuf>>,
}

impl<'a> ProcessingGuard<'a> {
    fn enter(stack: &'a RefCell<Vec<PathBuf>>, path: &Path) -> Result<Self, RenderError> {
        let mut entries = stack.borrow_mut();
        if entries.iter().any(|p| p == path) {
            return Err(RenderError::CircularInclusion {
                path: path.to_path_buf(),
            });
        }
        entries.push(path.to_path_buf());
        Ok(ProcessingGuard { stack })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// What a command sees while handling a snippet.
///
/// Owned by one render; descending into another file builds a new context
/// rather than mutating this one.
#[derive(Clone)]
pub struct RenderContext<'a> {
    renderer: &'a Renderer<'a>,
    /// Directory of the file being rendered.
    pub working_dir: PathBuf,
    /// Directory the rendered output will be written to.
    pub target_dir: PathBuf,
    pub scope: DocumentScope<'a>,
}

impl<'a> RenderContext<'a> {
    pub fn root_dir(&self) -> &Path {
        self.renderer.root_dir()
    }

    pub fn store(&self) -> &'a dyn FileStore {
        self.renderer.store()
    }

    pub fn parameters(&self) -> &'a Parameters {
        self.scope.parameters
    }

    /// The top-level template being expanded.
    pub fn source(&self) -> &'a SourcePath {
        self.scope.source
    }

    pub fn collected(&self) -> Option<&'a CollectedData> {
        self.scope.collected
    }

    pub fn with_working_dir(&self, dir: impl Into<PathBuf>) -> Self {
        RenderContext {
            working_dir: dir.into(),
            ..self.clone()
        }
    }

    /// Render another file as a whole document.
    pub fn render(
        &self,
        path: &Path,
        target_dir: &Path,
        content: Option<&str>,
    ) -> Result<String, RenderError> {
        self.renderer.render(self.scope, path, target_dir, content)
    }

    /// Render another file as part of the current document.
    pub fn include(&self, path: &Path) -> Result<String, RenderError> {
        self.renderer.render_with_mode(
            self.scope,
            path,
            &self.target_dir,
            None,
            RenderMode::Fragment,
        )
    }

    /// Render a template into the imports directory (once per run) and
    /// return an `@path` reference to it, relative to the target directory.
    pub fn import(&self, reference: &str) -> Result<String, MacroError> {
        self.renderer.import(self, reference)
    }

    /// Resolve a file reference from a snippet argument.
    ///
    /// `/x` is relative to the root directory; anything else is relative to
    /// the working directory.
    pub fn resolve_path(&self, reference: &str) -> PathBuf {
        match reference.strip_prefix('/') {
            Some(rooted) => normalize_path(&self.root_dir().join(rooted)),
            None => normalize_path(&self.working_dir.join(reference)),
        }
    }

    /// Path of `target` relative to the target directory, with `/`
    /// separators.
    pub fn relative_to_target(&self, target: &Path) -> String {
        let relative = relative_path(&self.target_dir, target).unwrap_or_else(|| target.to_path_buf());
        to_slash(&relative)
    }

    /// `@path` reference to a root-relative file, as seen from the target
    /// directory.
    pub fn file_import(&self, root_relative: &str) -> String {
        let target = join_normalized(self.root_dir(), root_relative);
        format!("@{}", self.relative_to_target(&target))
    }

    /// Record a reference to a skill from the current template.
    pub fn check_skill(&self, name: &str) {
        self.renderer
            .references
            .borrow_mut()
            .check_skill(&self.scope.source.relative, name);
    }

    /// Record a reference to a doc from the current template.
    pub fn check_doc(&self, name: &str) {
        self.renderer
            .references
            .borrow_mut()
            .check_doc(&self.scope.source.relative, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, InlineCommand};
    use docgen_runtime::MemoryFileStore;
    use pretty_assertions::assert_eq;

    fn source() -> SourcePath {
        SourcePath::new(Path::new("/root/src/main.md"), Path::new("/root")).unwrap()
    }

    fn scope<'a>(source: &'a SourcePath, parameters: &'a Parameters) -> DocumentScope<'a> {
        DocumentScope {
            source,
            parameters,
            collected: None,
            macros_enabled: true,
        }
    }

    fn upper_registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(InlineCommand::new("upper", |_ctx: &RenderContext<'_>, args: &[String]| {
            Ok(args.join(" ").to_uppercase())
        }));
        registry
    }

    #[test]
    fn test_source_path() {
        let source = source();
        assert_eq!(source.relative, "src/main.md");
        assert!(SourcePath::new(Path::new("/elsewhere/a.md"), Path::new("/root")).is_none());
        assert!(SourcePath::new(Path::new("/root"), Path::new("/root")).is_none());
    }

    #[test]
    fn test_variables_then_snippets() {
        let store = MemoryFileStore::new();
        let registry = upper_registry();
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::from([("who".to_string(), "world".to_string())]);

        let out = renderer
            .render(
                scope(&source, &parameters),
                &source.path,
                Path::new("/root"),
                Some("  Hello {{who}}! {{upper: a, \"b c\"}} {{unknown: x}}  \n"),
            )
            .unwrap();

        assert_eq!(out, "Hello world! A B C {{unknown: x}}");
    }

    #[test]
    fn test_unresolved_variable_is_fatal() {
        let store = MemoryFileStore::new();
        let registry = upper_registry();
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::new();

        let err = renderer
            .render(
                scope(&source, &parameters),
                &source.path,
                Path::new("/root"),
                Some("Hello {{name}}"),
            )
            .unwrap_err();

        assert!(matches!(err, RenderError::UnresolvedVariable { ref name, .. } if name == "name"));
    }

    #[test]
    fn test_macros_disabled_keeps_snippets() {
        let store = MemoryFileStore::new();
        let registry = upper_registry();
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::new();
        let mut scope = scope(&source, &parameters);
        scope.macros_enabled = false;

        let out = renderer
            .render(scope, &source.path, Path::new("/root"), Some("{{upper: a}}"))
            .unwrap();
        assert_eq!(out, "{{upper: a}}");
    }

    #[test]
    fn test_failed_render_releases_processing_entry() {
        let store = MemoryFileStore::new().with_file("/root/src/main.md", "{{boom}}");
        let mut registry = CommandRegistry::new();
        registry.register(InlineCommand::new("boom", |_ctx: &RenderContext<'_>, _args: &[String]| {
            Err(MacroError::invalid("boom", "always fails"))
        }));
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::new();

        for _ in 0..2 {
            let err = renderer
                .render(scope(&source, &parameters), &source.path, Path::new("/root"), None)
                .unwrap_err();
            assert!(matches!(err, RenderError::Macro { ref command, .. } if command == "boom"));
        }
        assert!(renderer.processing.borrow().is_empty());
    }

    #[test]
    fn test_after_hooks_run_for_documents_only() {
        struct Footer;

        impl Command for Footer {
            fn name(&self) -> &str {
                "footer"
            }

            fn invoke(&self, _ctx: &RenderContext<'_>, _args: &[String]) -> Result<String, MacroError> {
                Ok(String::new())
            }

            fn after(&self, content: String) -> String {
                format!("{content}\n-- footer")
            }
        }

        let store = MemoryFileStore::new()
            .with_file("/root/src/main.md", "Main\n\n{{include: part.md}}")
            .with_file("/root/src/part.md", "Part");
        let mut registry = CommandRegistry::new();
        registry.register(crate::command::IncludeCommand);
        registry.register(Footer);
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::new();

        let out = renderer
            .render(scope(&source, &parameters), &source.path, Path::new("/root"), None)
            .unwrap();
        assert_eq!(out, "Main\n\nPart\n-- footer");
    }

    #[test]
    fn test_fragments_expand_under_each_caller() {
        let store = MemoryFileStore::new().with_file("/root/src/part.md", "Hi {{name}}");
        let mut registry = CommandRegistry::new();
        registry.register(crate::command::IncludeCommand);
        let renderer = Renderer::new(&registry, &store, "/root");

        let first = SourcePath::new(Path::new("/root/src/a.md"), Path::new("/root")).unwrap();
        let second = SourcePath::new(Path::new("/root/src/b.md"), Path::new("/root")).unwrap();
        let a = Parameters::from([("name".to_string(), "A".to_string())]);
        let b = Parameters::from([("name".to_string(), "B".to_string())]);

        let out_a = renderer
            .render(scope(&first, &a), &first.path, Path::new("/root"), Some("{{include: part.md}}"))
            .unwrap();
        let out_b = renderer
            .render(scope(&second, &b), &second.path, Path::new("/root"), Some("{{include: part.md}}"))
            .unwrap();

        assert_eq!(out_a, "Hi A");
        assert_eq!(out_b, "Hi B");
        assert_eq!(store.read_count("/root/src/part.md"), 1);
    }

    #[test]
    fn test_context_paths() {
        let store = MemoryFileStore::new();
        let registry = CommandRegistry::new();
        let renderer = Renderer::new(&registry, &store, "/root");
        let source = source();
        let parameters = Parameters::new();
        let ctx = RenderContext {
            renderer: &renderer,
            working_dir: PathBuf::from("/root/src/guide"),
            target_dir: PathBuf::from("/root/docs/guide"),
            scope: scope(&source, &parameters),
        };

        assert_eq!(ctx.resolve_path("../a.md"), PathBuf::from("/root/src/a.md"));
        assert_eq!(ctx.resolve_path("./b.md"), PathBuf::from("/root/src/guide/b.md"));
        assert_eq!(ctx.resolve_path("/shared/c.md"), PathBuf::from("/root/shared/c.md"));
        assert_eq!(
            ctx.file_import("vendor/acme/log/README.md"),
            "@../../vendor/acme/log/README.md"
        );
        assert_eq!(
            ctx.with_working_dir("/root/other").resolve_path("x.md"),
            PathBuf::from("/root/other/x.md")
        );
    }

    #[test]
    fn test_free_import_targets() {
        let mut imports = Imports::default();
        let dir = Path::new("/root/imports");
        imports
            .targets
            .insert(PathBuf::from("/root/a/x.md"), dir.join("x.md"));
        imports
            .targets
            .insert(PathBuf::from("/root/b/x.md"), dir.join("x-1.md"));

        assert_eq!(
            imports.free_target(dir, Path::new("/root/c/x.md")),
            dir.join("x-2.md")
        );
        assert_eq!(
            imports.free_target(dir, Path::new("/root/c/y.md")),
            dir.join("y.md")
        );
    }
}
