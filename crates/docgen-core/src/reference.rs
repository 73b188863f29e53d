/*
 * reference.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Cross-document reference checking.
//!
//! Templates register the skills and docs they produce and record every
//! skill or doc they mention. Validation runs once all templates are
//! expanded, so a reference to something produced later in the run is fine.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::GenerateError;

/// The kinds of names a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Skill,
    Doc,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Skill => write!(f, "skill"),
            ReferenceKind::Doc => write!(f, "doc"),
        }
    }
}

#[derive(Debug, Clone)]
struct Use {
    file: String,
    kind: ReferenceKind,
    name: String,
}

/// Registry of produced names and recorded uses for one run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceChecker {
    skills: BTreeSet<String>,
    docs: BTreeSet<String>,
    uses: Vec<Use>,
}

impl ReferenceChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_skill(&mut self, name: impl Into<String>) {
        self.skills.insert(name.into());
    }

    pub fn add_doc(&mut self, name: impl Into<String>) {
        self.docs.insert(name.into());
    }

    /// Record that `file` references the skill `name`.
    pub fn check_skill(&mut self, file: &str, name: &str) {
        self.record(file, ReferenceKind::Skill, name);
    }

    /// Record that `file` references the doc `name`.
    pub fn check_doc(&mut self, file: &str, name: &str) {
        self.record(file, ReferenceKind::Doc, name);
    }

    fn record(&mut self, file: &str, kind: ReferenceKind, name: &str) {
        self.uses.push(Use {
            file: file.to_string(),
            kind,
            name: name.to_string(),
        });
    }

    /// Fail on the first recorded use of a name nobody registered.
    pub fn validate(&self) -> Result<(), GenerateError> {
        for used in &self.uses {
            let known = match used.kind {
                ReferenceKind::Skill => &self.skills,
                ReferenceKind::Doc => &self.docs,
            };
            if !known.contains(&used.name) {
                return Err(GenerateError::UnknownReference {
                    file: used.file.clone(),
                    kind: used.kind,
                    name: used.name.clone(),
                });
            }
        }
        Ok(())
    }
}
