/*
 * macros.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reference and namespace macros.
 */

//! Macros that expand to inline code references.
//!
//! The namespace macros emit `%ModuleName%`/`%SubmoduleName%` placeholders
//! verbatim; they are filled in by whoever consumes the generated docs.

use std::rc::Rc;

use super::Command;
use crate::error::{MacroError, expect_args};
use crate::introspect::{IntrospectError, Introspector};
use crate::render::RenderContext;

fn non_empty<'s>(command: &str, args: &'s [String], what: &str) -> Result<&'s str, MacroError> {
    expect_args(command, args, 1, 1)?;
    let value = args[0].as_str();
    if value.is_empty() {
        return Err(MacroError::invalid(
            command,
            format!("expects non-empty {what} as argument"),
        ));
    }
    Ok(value)
}

/// `class-name: Class` -> `` `Class` ``
pub struct ClassNameMacro {
    introspector: Rc<dyn Introspector>,
}

impl ClassNameMacro {
    pub fn new(introspector: Rc<dyn Introspector>) -> Self {
        ClassNameMacro { introspector }
    }
}

impl Command for ClassNameMacro {
    fn name(&self) -> &str {
        "class-name"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        if !self.introspector.class_exists(&args[0]) {
            return Err(IntrospectError::UnknownClass(args[0].clone()).into());
        }
        Ok(format!("`{}`", args[0]))
    }
}

/// `module-namespace: X`
pub struct ModuleNamespaceMacro;

impl Command for ModuleNamespaceMacro {
    fn name(&self) -> &str {
        "module-namespace"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        Ok(format!("`Module\\%ModuleName%\\{}`", args[0]))
    }
}

/// `submodule-namespace: X`
pub struct SubmoduleNamespaceMacro;

impl Command for SubmoduleNamespaceMacro {
    fn name(&self) -> &str {
        "submodule-namespace"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 1, 1)?;
        Ok(format!("`Module\\%ModuleName%\\%SubmoduleName%\\{}`", args[0]))
    }
}

/// `test-module-namespace: Kind, X`
pub struct TestModuleNamespaceMacro;

impl Command for TestModuleNamespaceMacro {
    fn name(&self) -> &str {
        "test-module-namespace"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 2, 2)?;
        Ok(format!("`Tests\\{}\\Module\\%ModuleName%\\{}`", args[0], args[1]))
    }
}

/// `test-submodule-namespace: Kind, A, B`
pub struct TestSubmoduleNamespaceMacro;

impl Command for TestSubmoduleNamespaceMacro {
    fn name(&self) -> &str {
        "test-submodule-namespace"
    }

    fn invoke(&self, _ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 3, 3)?;
        Ok(format!(
            "`Tests\\{}Module\\%ModuleName%\\{}\\%SubmoduleName%\\{}`",
            args[0], args[1], args[2]
        ))
    }
}

/// `skill-reference: name` records a use of the skill `name`.
pub struct SkillReferenceMacro;

impl Command for SkillReferenceMacro {
    fn name(&self) -> &str {
        "skill-reference"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        let name = non_empty(self.name(), args, "skill name")?;
        ctx.check_skill(name);
        Ok(format!("`{name}`"))
    }
}

/// `docs-reference: path` records a use of the doc `path`.
pub struct DocsReferenceMacro;

impl Command for DocsReferenceMacro {
    fn name(&self) -> &str {
        "docs-reference"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        let name = non_empty(self.name(), args, "doc path")?;
        ctx.check_doc(name);
        Ok(format!("`{name}`"))
    }
}

/// `docs-list`: numbered list of every declared doc.
///
/// Only the main document sees the collected docs.
pub struct DocsListMacro;

impl Command for DocsListMacro {
    fn name(&self) -> &str {
        "docs-list"
    }

    fn invoke(&self, ctx: &RenderContext<'_>, args: &[String]) -> Result<String, MacroError> {
        expect_args(self.name(), args, 0, 0)?;
        let Some(collected) = ctx.collected() else {
            return Err(MacroError::invalid(
                self.name(),
                "can be used only in the main documentation file",
            ));
        };

        let lines: Vec<String> = collected
            .docs
            .iter()
            .enumerate()
            .map(|(i, (path, description))| {
                let file_name = path.rsplit('/').next().unwrap_or(path);
                format!("{}. [{file_name}]({path}) - {description}", i + 1)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
