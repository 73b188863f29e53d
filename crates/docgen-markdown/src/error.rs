/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for header and frontmatter parsing.
//!
//! Snippet and variable scanning never fails; only interpreting header
//! values and decoding YAML frontmatter can.

use thiserror::Error;

/// Errors produced while interpreting document headers.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// A value that looks like a JSON array or string failed to decode.
    #[error("Invalid header value for '{name}': {value} ({message})")]
    InvalidValue {
        name: String,
        value: String,
        message: String,
    },

    /// A decoded value (or array item) is an object or nested array.
    #[error("Invalid header value for '{name}': items must be scalar or null")]
    NonScalarValue { name: String },
}

/// Errors produced while decoding or encoding YAML frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// The frontmatter block is not valid YAML.
    #[error("Invalid frontmatter format: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// The frontmatter decoded to something other than a mapping.
    #[error("Invalid frontmatter format: expected a mapping, found {found}")]
    NotAMapping { found: &'static str },
}
