/*
 * collected.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Data collected from other templates for the main document.

/// Docs declared so far, keyed by their path relative to the root directory.
///
/// Built right before the main document is expanded and consumed by its
/// `docs-list` macro. Entries keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedData {
    pub docs: Vec<(String, String)>,
}

impl CollectedData {
    /// Prefix every docs target with the docs base path.
    ///
    /// Returns `None` when there are docs but no base path to place them in.
    pub fn create(docs: &[(String, String)], docs_base: Option<&str>) -> Option<Self> {
        if docs.is_empty() {
            return Some(Self::default());
        }

        let base = docs_base?.trim_matches('/');
        let docs = docs
            .iter()
            .map(|(target, description)| {
                let path = if base.is_empty() {
                    target.trim_start_matches('/').to_string()
                } else {
                    format!("{}/{}", base, target.trim_start_matches('/'))
                };
                (path, description.clone())
            })
            .collect();

        Some(CollectedData { docs })
    }
}
