/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Typed view of template frontmatter.
 */

//! Frontmatter schema.
//!
//! [`TemplateSpec::from_frontmatter`] checks the decoded YAML mapping of a
//! template and reports every structural problem at once, as a
//! [`SchemaViolations`] list, instead of stopping at the first one.
//!
//! Unknown top-level keys are allowed (templates may carry metadata for
//! other tools). The objects of the directives themselves are strict.

use serde_json::{Map, Value};

use crate::error::{SchemaViolation, SchemaViolations};
use crate::introspect::VisibilityMask;

pub const DEFAULT_PRIORITY: u8 = 5;
pub const MAX_PRIORITY: u8 = 10;

/// Expansion order of a template.
///
/// Templates are expanded from the highest rank to the lowest, and the main
/// document after all of them. Deriving `Ord` with `Main` declared first
/// makes a descending sort produce exactly that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Main,
    Ranked(u8),
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Ranked(DEFAULT_PRIORITY)
    }
}

/// One class of the `api` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEntry {
    pub class: String,
    pub visibility: VisibilityMask,
}

/// Where an example comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExampleSource {
    /// Source file of a class, found through the introspector.
    Class(String),
    /// A file relative to the root directory.
    File(String),
}

/// One entry of the `examples` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    pub source: ExampleSource,
    /// Strings the example must contain.
    pub contains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDirective {
    pub target: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirective {
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsDirective {
    pub target: String,
    pub description: String,
}

/// One entry of the `commands` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDirective {
    pub name: String,
    pub prompt: String,
}

/// Everything a frontmatter template declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSpec {
    pub main: bool,
    pub priority: Priority,
    pub macros_disabled: bool,
    pub api: Vec<ApiEntry>,
    pub examples: Vec<ExampleEntry>,
    pub skill: Option<SkillDirective>,
    pub output: Option<OutputDirective>,
    pub docs: Option<DocsDirective>,
    pub commands: Vec<CommandDirective>,
}

impl TemplateSpec {
    pub fn from_frontmatter(data: &Map<String, Value>) -> Result<Self, SchemaViolations> {
        let mut checker = Checker::default();
        let mut spec = TemplateSpec {
            priority: checker.priority(data),
            ..TemplateSpec::default()
        };

        if let Some(value) = data.get("main") {
            spec.main = checker.boolean(value, "main").unwrap_or(false);
            if spec.main {
                spec.priority = Priority::Main;
            }
        }

        if let Some(value) = data.get("macros") {
            if let Some(macros) = checker.object(value, "macros", &["disabled"]) {
                if let Some(disabled) = macros.get("disabled") {
                    spec.macros_disabled = checker.boolean(disabled, "macros.disabled").unwrap_or(false);
                }
            }
        }

        if let Some(value) = data.get("api") {
            spec.api = checker.api(value);
        }
        if let Some(value) = data.get("examples") {
            spec.examples = checker.examples(value);
        }

        if let Some(value) = data.get("skill") {
            if let Some(skill) = checker.object(value, "skill", &["target", "name", "description"]) {
                let target = checker.required_string(skill, "skill", "target");
                let name = checker.required_string(skill, "skill", "name");
                let description = checker.required_string(skill, "skill", "description");
                if let (Some(target), Some(name), Some(description)) = (target, name, description) {
                    spec.skill = Some(SkillDirective {
                        target,
                        name,
                        description,
                    });
                }
            }
        }

        if let Some(value) = data.get("output") {
            if let Some(output) = checker.object(value, "output", &["target"]) {
                if let Some(target) = checker.required_string(output, "output", "target") {
                    spec.output = Some(OutputDirective { target });
                }
            }
        }

        if let Some(value) = data.get("docs") {
            if let Some(docs) = checker.object(value, "docs", &["target", "description"]) {
                let target = checker.required_string(docs, "docs", "target");
                let description = checker.required_string(docs, "docs", "description");
                if let (Some(target), Some(description)) = (target, description) {
                    spec.docs = Some(DocsDirective {
                        target,
                        description,
                    });
                }
            }
        }

        if let Some(value) = data.get("commands") {
            spec.commands = checker.commands(value);
        }

        checker.finish(spec)
    }
}

/// Priority of a legacy template, read leniently: `main: true` or an
/// in-range `metadata.priority`, the default otherwise.
pub fn legacy_priority(data: &Map<String, Value>) -> Priority {
    if data.get("main").and_then(Value::as_bool) == Some(true) {
        return Priority::Main;
    }
    data.get("metadata")
        .and_then(|m| m.get("priority"))
        .and_then(Value::as_u64)
        .filter(|p| *p <= u64::from(MAX_PRIORITY))
        .map_or(Priority::default(), |p| Priority::Ranked(p as u8))
}

/// Short description of a value for violation messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.is_empty() => "empty string".to_string(),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) if items.is_empty() => "empty list".to_string(),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "mapping".to_string(),
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<SchemaViolation>,
}

impl Checker {
    fn violation(&mut self, path: impl Into<String>, expected: &str, found: impl Into<String>) {
        self.violations.push(SchemaViolation {
            path: path.into(),
            expected: expected.to_string(),
            found: found.into(),
        });
    }

    fn finish<T>(self, value: T) -> Result<T, SchemaViolations> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(SchemaViolations(self.violations))
        }
    }

    fn boolean(&mut self, value: &Value, path: &str) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            other => {
                self.violation(path, "boolean", describe(other));
                None
            }
        }
    }

    fn string(&mut self, value: &Value, path: &str) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            other => {
                self.violation(path, "non-empty string", describe(other));
                None
            }
        }
    }

    fn required_string(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let path = format!("{parent}.{key}");
        match object.get(key) {
            Some(value) => self.string(value, &path),
            None => {
                self.violation(path, "non-empty string", "missing");
                None
            }
        }
    }

    fn list<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v [Value]> {
        match value {
            Value::Array(items) if !items.is_empty() => Some(items.as_slice()),
            other => {
                self.violation(path, "non-empty list", describe(other));
                None
            }
        }
    }

    fn string_list(&mut self, value: &Value, path: &str) -> Vec<String> {
        let Some(items) = self.list(value, path) else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.string(item, &format!("{path}[{i}]")))
            .collect()
    }

    /// A mapping whose keys are all in `allowed`.
    fn object<'v>(&mut self, value: &'v Value, path: &str, allowed: &[&str]) -> Option<&'v Map<String, Value>> {
        let Value::Object(map) = value else {
            self.violation(path, "mapping", describe(value));
            return None;
        };
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.violation(
                    format!("{path}.{key}"),
                    &format!("one of {}", allowed.join(", ")),
                    "unknown key",
                );
            }
        }
        Some(map)
    }

    fn priority(&mut self, data: &Map<String, Value>) -> Priority {
        let Some(metadata) = data.get("metadata") else {
            return Priority::default();
        };
        let Some(metadata) = self.object(metadata, "metadata", &["priority"]) else {
            return Priority::default();
        };
        match metadata.get("priority") {
            None => Priority::default(),
            Some(value) => match value.as_u64() {
                Some(p) if p <= u64::from(MAX_PRIORITY) => Priority::Ranked(p as u8),
                _ => {
                    self.violation("metadata.priority", "integer between 0 and 10", describe(value));
                    Priority::default()
                }
            },
        }
    }

    fn api(&mut self, value: &Value) -> Vec<ApiEntry> {
        let Some(items) = self.list(value, "api") else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let path = format!("api[{i}]");
            if let Value::String(_) = item {
                if let Some(class) = self.string(item, &path) {
                    entries.push(ApiEntry {
                        class,
                        visibility: VisibilityMask::PUBLIC,
                    });
                }
                continue;
            }

            let Some(object) = self.object(item, &path, &["class", "visibilities"]) else {
                continue;
            };
            let class = self.required_string(object, &path, "class");
            let visibilities = object
                .get("visibilities")
                .map(|v| self.string_list(v, &format!("{path}.visibilities")))
                .unwrap_or_default();
            if let Some(class) = class {
                entries.push(ApiEntry {
                    class,
                    visibility: VisibilityMask::from_list(&visibilities),
                });
            }
        }
        entries
    }

    fn examples(&mut self, value: &Value) -> Vec<ExampleEntry> {
        let Some(items) = self.list(value, "examples") else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let path = format!("examples[{i}]");
            if let Value::String(_) = item {
                if let Some(class) = self.string(item, &path) {
                    entries.push(ExampleEntry {
                        source: ExampleSource::Class(class),
                        contains: Vec::new(),
                    });
                }
                continue;
            }

            let Some(object) = self.object(item, &path, &["class", "file", "contains"]) else {
                continue;
            };
            let source = match (object.contains_key("class"), object.contains_key("file")) {
                (true, false) => self
                    .required_string(object, &path, "class")
                    .map(ExampleSource::Class),
                (false, true) => self
                    .required_string(object, &path, "file")
                    .map(ExampleSource::File),
                (true, true) => {
                    self.violation(path.clone(), "either class or file", "both");
                    None
                }
                (false, false) => {
                    self.violation(path.clone(), "class or file", "missing");
                    None
                }
            };
            let contains = object
                .get("contains")
                .map(|v| self.string_list(v, &format!("{path}.contains")))
                .unwrap_or_default();
            if let Some(source) = source {
                entries.push(ExampleEntry { source, contains });
            }
        }
        entries
    }

    fn commands(&mut self, value: &Value) -> Vec<CommandDirective> {
        let Some(items) = self.list(value, "commands") else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let path = format!("commands[{i}]");
            let Some(object) = self.object(item, &path, &["name", "prompt"]) else {
                continue;
            };
            let name = self.required_string(object, &path, "name");
            let prompt = self.required_string(object, &path, "prompt");
            if let (Some(name), Some(prompt)) = (name, prompt) {
                commands.push(CommandDirective { name, prompt });
            }
        }
        commands
    }
}
