/*
 * builtin.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rendering commands registered by default.
 */

//! Builtin rendering commands.
//!
//! | Snippet | Result |
//! |---|---|
//! | `{{dump: Class, "public, protected"}}` | fenced class signature |
//! | `{{@context: Class}}` | nothing; a `## Context` section is appended |
//! | `{{@package: vendor/name, Label}}` | nothing; a `## Documentations` section is appended |
//! | `{{@import: file.md}}` | `@path` reference to the rendered file |
//! | `{{include: file.md}}` | rendered file contents |
//! | `{{include-once: file.md}}` | rendered file contents, once per document |
//! | `{{print: Class}}` | class source file |
//! | `{{print-code-block: Class}}` | class source file, fenced |

use std::path::PathBuf;
use std::rc::Rc;

use tracing::warn;

use super::{Command, DocumentStack};
use crate::error::{MacroError, expect_args};
use crate::introspect::{Introspector, SignatureOptions, VisibilityMask};
use crate::render::RenderContext;

const CONTEXT_DESCRIPTION: &str = "Below are short PHP code snippets. These snippets contain the basic \
structure of important classes, including methods, properties, parameters, namespace, class name, \
and PHPDoc comments.";

const PACKAGE_DESCRIPTION: &str = "Below are documentations of 3rd party libraries for further \
knowledge. List contains BaseNamespace - documentation file";

/// Documentation files looked up for `@package`, in order of preference.
const PACKAGE_DOC_FILES: [&str; 4] = ["CLAUDE.md", "AGENTS.md", "README.md", "readme.md"];

fn fenced(language: &str, code: &str) -> String {
    format!("```{language}\n{}\n```", code.trim())
}

/// Keep the first entry per key, in source order.
///
/// Snippets are dispatched from the last one to the first, so the collected
/// entries arrive reversed.
fn source_order(entries: &[(String, String)]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out = Vec::new();
    for (key, value) in entries.iter().rev() {
        if !seen.contains(&key.as_str()) {
            seen.push(key);
            out.push(value.as_str());
        }
    }
    out
}

/// `dump: Class [, visibilities]`
pub struct DumpCommand {
    introspector: Rc<dyn Introspector>,
}

impl DumpCommand {
    pub fn new(introspector: Rc<dyn Introspector>) -> Self {
        DumpCommand { introspector }
    }

    fn dump(&self, args: &[String]) -> Result<String, MacroError> {
        let class = &args[0];
        let mask = VisibilityMask::from_text(args.get(1).map(String::as_str).unwrap_or(""));
        let signature = self
            .introspector
            .class_signature(class, &SignatureOptions::with_visibility(mask))?;

        Ok(format!(
            "Code snippet of **{class}**:\n{}",
            fenced(self.introspector.language(), &signature)
        ))
    }
}

impl Command for DumpCommand {
    fn name(&self) -> &str {
        "dump"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 2)?;
        self.dump(args)
    }
}

/// `@context: Class [, visibilities]`
///
/// Collects class dumps and appends them under `## Context`.
pub struct ContextCommand {
    dump: DumpCommand,
    description: String,
    stack: DocumentStack<(String, String)>,
}

impl ContextCommand {
    pub fn new(introspector: Rc<dyn Introspector>) -> Self {
        Self::with_description(introspector, CONTEXT_DESCRIPTION)
    }

    pub fn with_description(introspector: Rc<dyn Introspector>, description: impl Into<String>) -> Self {
        ContextCommand {
            dump: DumpCommand::new(introspector),
            description: description.into(),
            stack: DocumentStack::new(),
        }
    }
}

impl Command for ContextCommand {
    fn name(&self) -> &str {
        "@context"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 2)?;
        let dump = self.dump.dump(args)?;
        self.stack.push((args[0].clone(), dump));
        Ok(String::new())
    }

    fn begin(&self) {
        self.stack.begin();
    }

    fn after(&self, content: String) -> String {
        self.stack.with_current(|entries| {
            if entries.is_empty() {
                return content;
            }
            format!(
                "{content}\n\n## Context\n{}\n\n{}",
                self.description,
                source_order(entries).join("\n\n")
            )
        })
    }

    fn reset(&self) {
        self.stack.end();
    }
}

/// `@package: vendor/name, Label`
///
/// Links the documentation file of an installed package under
/// `## Documentations`.
pub struct PackageCommand {
    description: String,
    stack: DocumentStack<(String, String)>,
}

impl PackageCommand {
    pub fn new() -> Self {
        Self::with_description(PACKAGE_DESCRIPTION)
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        PackageCommand {
            description: description.into(),
            stack: DocumentStack::new(),
        }
    }
}

impl Default for PackageCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for PackageCommand {
    fn name(&self) -> &str {
        "@package"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 2, 2)?;
        let package = args[0].trim_matches('/');

        for file in PACKAGE_DOC_FILES {
            let relative = format!("vendor/{package}/{file}");
            if ctx.store().is_file(&ctx.root_dir().join(&relative))? {
                let entry = format!("- {} - {}", args[1], ctx.file_import(&relative));
                self.stack.push((package.to_string(), entry));
                return Ok(String::new());
            }
        }

        warn!(package, "no documentation file found for package");
        Ok(String::new())
    }

    fn begin(&self) {
        self.stack.begin();
    }

    fn after(&self, content: String) -> String {
        self.stack.with_current(|entries| {
            if entries.is_empty() {
                return content;
            }
            format!(
                "{content}\n\n## Documentations\n{}\n\n{}",
                self.description,
                source_order(entries).join("\n")
            )
        })
    }

    fn reset(&self) {
        self.stack.end();
    }
}

/// `@import: file.md`
pub struct ImportCommand;

impl Command for ImportCommand {
    fn name(&self) -> &str {
        "@import"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        ctx.import(&args[0])
    }
}

fn existing_file(ctx: &RenderContext<'_>, reference: &str) -> Result<PathBuf, MacroError> {
    let path = ctx.resolve_path(reference);
    if !ctx.store().is_file(&path)? {
        return Err(MacroError::MissingFile(path));
    }
    Ok(path)
}

/// `include: file.md`
pub struct IncludeCommand;

impl Command for IncludeCommand {
    fn name(&self) -> &str {
        "include"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        let path = existing_file(ctx, &args[0])?;
        Ok(ctx.include(&path)?)
    }
}

/// `include-once: file.md`
pub struct IncludeOnceCommand {
    included: DocumentStack<PathBuf>,
}

impl IncludeOnceCommand {
    pub fn new() -> Self {
        IncludeOnceCommand {
            included: DocumentStack::new(),
        }
    }
}

impl Default for IncludeOnceCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for IncludeOnceCommand {
    fn name(&self) -> &str {
        "include-once"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        let path = existing_file(ctx, &args[0])?;

        if self.included.with_current(|seen| seen.contains(&path)) {
            return Ok(String::new());
        }
        self.included.push(path.clone());

        Ok(ctx.include(&path)?)
    }

    fn begin(&self) {
        self.included.begin();
    }

    fn reset(&self) {
        self.included.end();
    }
}

fn class_source(
    introspector: &dyn Introspector,
    ctx: &RenderContext<'_>,
    class: &str,
) -> Result<String, MacroError> {
    let path = introspector.class_source_file(class)?;
    Ok(ctx.store().file_read_string(&path)?)
}

/// `print: Class`
pub struct PrintCommand {
    introspector: Rc<dyn Introspector>,
}

impl PrintCommand {
    pub fn new(introspector: Rc<dyn Introspector>) -> Self {
        PrintCommand { introspector }
    }
}

impl Command for PrintCommand {
    fn name(&self) -> &str {
        "print"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        class_source(self.introspector.as_ref(), ctx, &args[0])
    }
}

/// `print-code-block: Class`
pub struct PrintCodeBlockCommand {
    introspector: Rc<dyn Introspector>,
}

impl PrintCodeBlockCommand {
    pub fn new(introspector: Rc<dyn Introspector>) -> Self {
        PrintCodeBlockCommand { introspector }
    }
}

impl Command for PrintCodeBlockCommand {
    fn name(&self) -> &str {
        "print-code-block"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        let source = class_source(self.introspector.as_ref(), ctx, &args[0])?;
        Ok(fenced(self.introspector.language(), &source))
    }
}
