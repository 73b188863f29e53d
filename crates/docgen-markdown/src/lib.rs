/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsers for the docgen template mini-language.
//!
//! Templates are markdown documents with an embedded macro language:
//!
//! - Snippets: `{{name}}` or `{{name: arg, "quoted, arg"}}`
//! - Variables: `{{name}}` (bare form only)
//! - Headers: a `---` block of `key: value` lines, or legacy `#!` lines
//! - Frontmatter: the same `---` block decoded as YAML
//!
//! All scanners report byte [`Span`]s into the buffer they scanned.
//! [`splice`] replaces spanned items without disturbing the text between
//! them.
//!
//! # Example
//!
//! ```
//! use docgen_markdown::{parse_snippets, splice};
//!
//! let text = "{{a}}mid{{b}}";
//! let snippets = parse_snippets(text);
//! let out = splice::<_, std::convert::Infallible, _>(text, &snippets, |s| {
//!     Ok(Some(if s.name == "a" { "X".into() } else { "YZ".into() }))
//! })
//! .unwrap();
//! assert_eq!(out, "XmidYZ");
//! ```

pub mod error;
pub mod frontmatter;
pub mod header;
pub mod snippet;
pub mod span;
pub mod variable;

pub use error::{FrontmatterError, HeaderError};
pub use frontmatter::{Frontmatter, dump_frontmatter, extract_frontmatter};
pub use header::{Header, HeaderForm, ParsedHeaders, header_form, parse_headers, strip_headers};
pub use snippet::{Snippet, parse_snippets};
pub use span::{Span, Spanned, splice};
pub use variable::{Variable, parse_variables};
