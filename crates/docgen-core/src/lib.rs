//! Template expansion and generation for agent documentation.
//!
//! This crate turns a tree of markdown templates into skills, docs, Claude
//! commands and plain output files.
//!
//! # Architecture
//!
//! - [`Project`] - Root directory and `docgen.yml` settings
//! - [`CommandRegistry`] - Named commands invoked by `{{name: args}}` snippets
//! - [`Renderer`] - Recursive expansion of one template and everything it
//!   includes or imports, reading each file once per run
//! - [`Generator`] - Discovery, priority ordering, fan-out, reference
//!   validation, commit and stale-file cleanup for a whole run
//!
//! All file access goes through [`docgen_runtime::FileStore`].
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use docgen_core::{Generator, Project};
//! use docgen_runtime::MemoryFileStore;
//!
//! let store = MemoryFileStore::new()
//!     .with_file("/work/docs-src/guide.md", "---\noutput:\n  target: GUIDE.md\n---\nHello {{name}}\n")
//!     .with_file("/work/docs-src/docs-parameters.json", r#"{"name": "World"}"#);
//!
//! let project = Project::discover(&store, Path::new("/work"))?;
//! let report = Generator::new(&store, project).run()?;
//!
//! assert_eq!(report.written, vec!["GUIDE.md".to_string()]);
//! # Ok::<(), docgen_core::GenerateError>(())
//! ```

pub mod artifact;
pub mod collected;
pub mod command;
pub mod config;
pub mod error;
pub mod generator;
pub mod introspect;
pub mod manifest;
pub mod reference;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactSet};
pub use collected::CollectedData;
pub use command::{Command, CommandRegistry, DocumentStack, InlineCommand};
pub use config::{Project, ProjectConfig, load_parameters};
pub use error::{GenerateError, MacroError, RenderError, Result, SchemaViolation, SchemaViolations};
pub use generator::{GenerateReport, Generator};
pub use introspect::{
    IntrospectError, Introspector, NullIntrospector, SignatureOptions, StaticIntrospector,
    VisibilityMask,
};
pub use manifest::{MANIFEST_FILE, Manifest};
pub use reference::{ReferenceChecker, ReferenceKind};
pub use render::{DocumentScope, Parameters, RenderContext, RenderMode, Renderer, SourcePath};
pub use schema::{Priority, TemplateSpec};
