/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Command trait and registry.
 */

//! Commands handle snippets.
//!
//! A snippet `{{name: args}}` is dispatched to the command registered under
//! `name`. The command validates its arguments, performs its side effect
//! (recording a reference, collecting an entry) and returns the replacement
//! text for the snippet's span. It never edits the surrounding document.
//!
//! Commands that build a trailing section collect entries while a document
//! is rendered and emit the section from [`Command::after`]. Documents can
//! nest (an `@import` renders another document while the importing one is
//! still open), so per-document state lives in a [`DocumentStack`] that
//! [`Command::begin`] opens and [`Command::reset`] closes.

mod builtin;
mod macros;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::MacroError;
use crate::introspect::Introspector;
use crate::render::RenderContext;

pub use builtin::{
    ContextCommand, DumpCommand, ImportCommand, IncludeCommand, IncludeOnceCommand,
    PackageCommand, PrintCodeBlockCommand, PrintCommand,
};
pub use macros::{
    ClassNameMacro, DocsListMacro, DocsReferenceMacro, ModuleNamespaceMacro,
    SkillReferenceMacro, SubmoduleNamespaceMacro, TestModuleNamespaceMacro,
    TestSubmoduleNamespaceMacro,
};

/// A named snippet handler.
pub trait Command {
    /// The snippet name this command answers to.
    fn name(&self) -> &str;

    /// Produce the replacement text for one snippet.
    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError>;

    /// A document starts rendering.
    fn begin(&self) {}

    /// Post-process a document once all of its snippets are resolved.
    fn after(&self, content: String) -> String {
        content
    }

    /// A document finished rendering; drop its collected state.
    fn reset(&self) {}
}

/// Commands in registration order, addressable by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin command and macro.
    pub fn with_builtins(introspector: Rc<dyn Introspector>) -> Self {
        let mut registry = Self::new();

        registry.register(DumpCommand::new(introspector.clone()));
        registry.register(ContextCommand::new(introspector.clone()));
        registry.register(PackageCommand::new());
        registry.register(ImportCommand);
        registry.register(IncludeCommand);
        registry.register(IncludeOnceCommand::new());
        registry.register(PrintCommand::new(introspector.clone()));
        registry.register(PrintCodeBlockCommand::new(introspector.clone()));

        registry.register(ClassNameMacro::new(introspector));
        registry.register(SubmoduleNamespaceMacro);
        registry.register(ModuleNamespaceMacro);
        registry.register(TestModuleNamespaceMacro);
        registry.register(TestSubmoduleNamespaceMacro);
        registry.register(SkillReferenceMacro);
        registry.register(DocsReferenceMacro);
        registry.register(DocsListMacro);

        registry
    }

    /// Add a command. A command with the same name is replaced in place.
    pub fn register(&mut self, command: impl Command + 'static) {
        let command: Box<dyn Command> = Box::new(command);
        match self.commands.iter().position(|c| c.name() == command.name()) {
            Some(index) => self.commands[index] = command,
            None => self.commands.push(command),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn begin_document(&self) {
        for command in &self.commands {
            command.begin();
        }
    }

    pub(crate) fn after_document(&self, content: String) -> String {
        self.commands
            .iter()
            .fold(content, |content, command| command.after(content))
    }

    pub(crate) fn reset_document(&self) {
        for command in &self.commands {
            command.reset();
        }
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A command backed by a caller-supplied closure.
pub struct InlineCommand<F> {
    name: String,
    callback: F,
}

impl<F> InlineCommand<F>
where
    F: Fn(&RenderContext<'_>, &[String]) -> Result<String, MacroError>,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        InlineCommand {
            name: name.into(),
            callback,
        }
    }
}

impl<F> Command for InlineCommand<F>
where
    F: Fn(&RenderContext<'_>, &[String]) -> Result<String, MacroError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        (self.callback)(ctx, args)
    }
}

/// Per-document collected entries, one frame per open document.
#[derive(Debug)]
pub struct DocumentStack<T> {
    frames: RefCell<Vec<Vec<T>>>,
}

impl<T> Default for DocumentStack<T> {
    fn default() -> Self {
        DocumentStack {
            frames: RefCell::new(Vec::new()),
        }
    }
}

impl<T> DocumentStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for a document that starts rendering.
    pub fn begin(&self) {
        self.frames.borrow_mut().push(Vec::new());
    }

    /// Add an entry to the innermost open document.
    pub fn push(&self, entry: T) {
        let mut frames = self.frames.borrow_mut();
        if frames.is_empty() {
            frames.push(Vec::new());
        }
        if let Some(frame) = frames.last_mut() {
            frame.push(entry);
        }
    }

    /// Inspect the entries of the innermost open document.
    pub fn with_current<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let frames = self.frames.borrow();
        f(frames.last().map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Close the innermost frame.
    pub fn end(&self) {
        self.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::NullIntrospector;

    struct Named(&'static str);

    impl Command for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn invoke(&self, _ctx: &RenderContext<'_>, _args: &[String]) -> Result<String, MacroError> {
            Ok(self.0.to_string())
        }

        fn after(&self, content: String) -> String {
            format!("{content}+{}", self.0)
        }
    }

    #[test]
    fn test_builtin_registration_order() {
        let registry = CommandRegistry::with_builtins(Rc::new(NullIntrospector));
        let names: Vec<_> = registry.names().collect();

        assert_eq!(
            names,
            vec![
                "dump",
                "@context",
                "@package",
                "@import",
                "include",
                "include-once",
                "print",
                "print-code-block",
                "class-name",
                "submodule-namespace",
                "module-namespace",
                "test-module-namespace",
                "test-submodule-namespace",
                "skill-reference",
                "docs-reference",
                "docs-list",
            ]
        );
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = CommandRegistry::new();
        registry.register(Named("a"));
        registry.register(Named("b"));
        registry.register(Named("a"));

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(registry.contains("b"));
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_after_runs_in_registration_order() {
        let mut registry = CommandRegistry::new();
        registry.register(Named("a"));
        registry.register(Named("b"));

        assert_eq!(registry.after_document("doc".to_string()), "doc+a+b");
    }

    #[test]
    fn test_document_stack_nesting() {
        let stack: DocumentStack<u32> = DocumentStack::new();
        stack.begin();
        stack.push(1);
        stack.begin();
        stack.push(2);
        assert_eq!(stack.with_current(|e| e.to_vec()), vec![2]);
        stack.end();
        assert_eq!(stack.with_current(|e| e.to_vec()), vec![1]);
        stack.end();
        assert!(stack.with_current(|e| e.is_empty()));
    }
}
