/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for docgen-core.
//!
//! Every error carries its context (template path, command name, missing
//! identifier) from the moment it is constructed.

use std::fmt;
use std::path::PathBuf;

use docgen_markdown::{FrontmatterError, HeaderError};
use docgen_runtime::RuntimeError;
use thiserror::Error;

use crate::introspect::IntrospectError;
use crate::reference::ReferenceKind;

/// Error raised by a command while handling one snippet.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Wrong number of arguments.
    #[error("Macro \"{command}\" expects {expected}, {actual} given")]
    Arity {
        command: String,
        expected: String,
        actual: usize,
    },

    /// An argument violates the command's preconditions.
    #[error("Macro \"{command}\" {message}")]
    Invalid { command: String, message: String },

    /// The class introspector could not answer.
    #[error("{0}")]
    Introspect(#[from] IntrospectError),

    /// A referenced file does not exist.
    #[error("File \"{}\" does not exist", .0.display())]
    MissingFile(PathBuf),

    /// Rendering a nested document failed.
    #[error("{0}")]
    Render(Box<RenderError>),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl From<RenderError> for MacroError {
    fn from(err: RenderError) -> Self {
        MacroError::Render(Box::new(err))
    }
}

impl MacroError {
    pub fn invalid(command: &str, message: impl Into<String>) -> Self {
        MacroError::Invalid {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

/// Check that a command received between `min` and `max` arguments.
pub fn expect_args(
    command: &str,
    args: &[String],
    min: usize,
    max: usize,
) -> std::result::Result<(), MacroError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }

    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    let expected = if min == max {
        format!("exactly {min} {}", plural(min))
    } else {
        format!("{min} to {max} arguments")
    };

    Err(MacroError::Arity {
        command: command.to_string(),
        expected,
        actual: args.len(),
    })
}

/// Error raised while rendering one document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document is already being rendered further up the call stack.
    #[error("Circular inclusion detected for file \"{}\"", path.display())]
    CircularInclusion { path: PathBuf },

    /// A `{{name}}` variable has no value in the parameter map.
    #[error("Variable \"{name}\" not found in parameters (in \"{}\")", path.display())]
    UnresolvedVariable { path: PathBuf, name: String },

    /// A command failed while expanding a snippet.
    #[error("Macro \"{command}\" failed in \"{}\": {source}", path.display())]
    Macro {
        path: PathBuf,
        command: String,
        #[source]
        source: MacroError,
    },

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

/// One structural mismatch found in a frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path to the offending value, e.g. `skill.name` or `api[1].class`.
    pub path: String,
    pub expected: String,
    pub found: String,
}

/// All structural mismatches found in one frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

impl SchemaViolations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaViolation> {
        self.0.iter()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}: expected {}, found {}", v.path, v.expected, v.found)?;
        }
        Ok(())
    }
}

/// Error that aborts a generation run.
///
/// Template paths are relative to the root directory.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Directory \"{}\" does not exist", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("File \"{path}\" does not contain frontmatter")]
    MissingFrontmatter { path: String },

    #[error("File \"{path}\" has invalid frontmatter: {source}")]
    Frontmatter {
        path: String,
        #[source]
        source: FrontmatterError,
    },

    #[error("File \"{path}\" has invalid headers: {source}")]
    Header {
        path: String,
        #[source]
        source: HeaderError,
    },

    #[error("Invalid frontmatter in \"{path}\":\n{violations}")]
    Schema {
        path: String,
        violations: SchemaViolations,
    },

    #[error("Rendering \"{path}\" failed: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },

    /// A directive could not be turned into an artifact.
    #[error("Generating files from template \"{path}\" failed: {message}")]
    Template { path: String, message: String },

    #[error("Docs target \"{target}\" is declared by both \"{first}\" and \"{second}\"")]
    DuplicateDocs {
        target: String,
        first: String,
        second: String,
    },

    #[error("Output \"{path}\" is produced by both \"{first}\" and \"{second}\"")]
    DuplicateArtifact {
        path: String,
        first: String,
        second: String,
    },

    #[error("Output \"{path}\" of template \"{template}\" is outside the root directory")]
    PathOutsideRoot { path: String, template: String },

    #[error("File \"{file}\" uses unknown {kind} \"{name}\"")]
    UnknownReference {
        file: String,
        kind: ReferenceKind,
        name: String,
    },

    #[error("Invalid manifest \"{}\": {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Invalid parameters file \"{}\": {message}", path.display())]
    Parameters { path: PathBuf, message: String },

    #[error("Invalid configuration \"{}\": {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl GenerateError {
    pub fn template(path: &str, message: impl Into<String>) -> Self {
        GenerateError::Template {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for generation.
pub type Result<T> = std::result::Result<T, GenerateError>;
