/*
 * introspect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Class introspection boundary.
//!
//! Some commands and directives print the signature or the source of a class
//! from the documented code base. How classes are found and formatted is
//! language specific and lives behind the [`Introspector`] trait; the
//! generator only needs code-block-ready text back.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by an [`Introspector`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntrospectError {
    #[error("Class \"{0}\" does not exist")]
    UnknownClass(String),

    #[error("Class \"{0}\" does not have a file location")]
    NoSourceFile(String),

    #[error("Cannot describe class \"{class}\": {message}")]
    Failed { class: String, message: String },
}

/// Which member visibilities to include in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityMask {
    pub public: bool,
    pub protected: bool,
    pub private: bool,
}

impl VisibilityMask {
    pub const PUBLIC: VisibilityMask = VisibilityMask {
        public: true,
        protected: false,
        private: false,
    };

    /// Build a mask from a list such as `["public", "protected"]`.
    ///
    /// An empty list means public members only.
    pub fn from_list<S: AsRef<str>>(items: &[S]) -> Self {
        if items.is_empty() {
            return Self::PUBLIC;
        }
        let has = |name: &str| items.iter().any(|i| i.as_ref() == name);
        VisibilityMask {
            public: has("public"),
            protected: has("protected"),
            private: has("private"),
        }
    }

    /// Build a mask from free text such as `"public, private"`.
    ///
    /// An empty string means public members only.
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::PUBLIC;
        }
        VisibilityMask {
            public: text.contains("public"),
            protected: text.contains("protected"),
            private: text.contains("private"),
        }
    }
}

impl Default for VisibilityMask {
    fn default() -> Self {
        Self::PUBLIC
    }
}

/// Formatting options for [`Introspector::class_signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOptions {
    /// Members left out of the signature (constructors by default).
    pub exclude_members: Vec<String>,
    /// Keep only the first sentence of doc comments.
    pub short_description: bool,
    /// Include members inherited from parents and traits.
    pub include_inherited: bool,
    pub methods: VisibilityMask,
    pub properties: VisibilityMask,
    pub constants: VisibilityMask,
}

impl SignatureOptions {
    /// Options used by the `dump` command and the `api` directive: the same
    /// visibility for every member kind, constructor excluded.
    pub fn with_visibility(mask: VisibilityMask) -> Self {
        SignatureOptions {
            exclude_members: vec!["__construct".to_string()],
            short_description: false,
            include_inherited: true,
            methods: mask,
            properties: mask,
            constants: mask,
        }
    }
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self::with_visibility(VisibilityMask::PUBLIC)
    }
}

/// Access to classes of the documented code base.
pub trait Introspector {
    /// Fence language for signatures and class sources (e.g. `php`).
    fn language(&self) -> &str;

    fn class_exists(&self, name: &str) -> bool;

    /// A source-code rendering of the class' declaration and members.
    fn class_signature(
        &self,
        name: &str,
        options: &SignatureOptions,
    ) -> Result<String, IntrospectError>;

    /// Absolute path of the file declaring the class.
    fn class_source_file(&self, name: &str) -> Result<PathBuf, IntrospectError>;
}

/// Introspector that knows no classes.
#[derive(Debug, Clone, Default)]
pub struct NullIntrospector;

impl Introspector for NullIntrospector {
    fn language(&self) -> &str {
        "php"
    }

    fn class_exists(&self, _name: &str) -> bool {
        false
    }

    fn class_signature(
        &self,
        name: &str,
        _options: &SignatureOptions,
    ) -> Result<String, IntrospectError> {
        Err(IntrospectError::UnknownClass(name.to_string()))
    }

    fn class_source_file(&self, name: &str) -> Result<PathBuf, IntrospectError> {
        Err(IntrospectError::UnknownClass(name.to_string()))
    }
}

#[derive(Debug, Clone)]
struct StaticClass {
    signature: String,
    source_file: Option<PathBuf>,
}

/// Introspector backed by a fixed table of classes.
///
/// Useful for tests and for embedders that extract class information ahead
/// of time.
#[derive(Debug, Clone)]
pub struct StaticIntrospector {
    language: String,
    classes: BTreeMap<String, StaticClass>,
}

impl StaticIntrospector {
    pub fn new(language: impl Into<String>) -> Self {
        StaticIntrospector {
            language: language.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Register a class with its signature and optional source file.
    pub fn with_class(
        mut self,
        name: impl Into<String>,
        signature: impl Into<String>,
        source_file: Option<PathBuf>,
    ) -> Self {
        self.classes.insert(
            name.into(),
            StaticClass {
                signature: signature.into(),
                source_file,
            },
        );
        self
    }
}

impl Introspector for StaticIntrospector {
    fn language(&self) -> &str {
        &self.language
    }

    fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn class_signature(
        &self,
        name: &str,
        _options: &SignatureOptions,
    ) -> Result<String, IntrospectError> {
        self.classes
            .get(name)
            .map(|c| c.signature.clone())
            .ok_or_else(|| IntrospectError::UnknownClass(name.to_string()))
    }

    fn class_source_file(&self, name: &str) -> Result<PathBuf, IntrospectError> {
        let class = self
            .classes
            .get(name)
            .ok_or_else(|| IntrospectError::UnknownClass(name.to_string()))?;
        class
            .source_file
            .clone()
            .ok_or_else(|| IntrospectError::NoSourceFile(name.to_string()))
    }
}
