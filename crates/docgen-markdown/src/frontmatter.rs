/*
 * frontmatter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! YAML frontmatter decoding and encoding.
//!
//! The frontmatter block uses the same `---` delimiters as the header
//! parser; here its contents are decoded as YAML into a JSON object so the
//! generator can apply structural checks to it.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FrontmatterError;
use crate::header::{HeaderForm, locate_block};

/// Decoded frontmatter plus the document body that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter<'a> {
    pub data: Map<String, Value>,
    pub body: &'a str,
}

impl Frontmatter<'_> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Extract and decode the YAML frontmatter of `markdown`.
///
/// Returns `Ok(None)` when the document has no `---` block. An empty block
/// decodes to an empty map.
pub fn extract_frontmatter(markdown: &str) -> Result<Option<Frontmatter<'_>>, FrontmatterError> {
    let Some(block) = locate_block(markdown) else {
        return Ok(None);
    };
    if block.form != HeaderForm::Frontmatter {
        return Ok(None);
    }

    let yaml = block.lines.join("\n");
    if yaml.trim().is_empty() {
        return Ok(Some(Frontmatter {
            data: Map::new(),
            body: block.body,
        }));
    }

    let data = match serde_yaml::from_str::<Value>(&yaml)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(FrontmatterError::NotAMapping {
                found: value_kind(&other),
            });
        }
    };

    Ok(Some(Frontmatter {
        data,
        body: block.body,
    }))
}

/// Encode `values` as a frontmatter block: `---\n{yaml}---\n\n`.
///
/// Field order follows the serialization order of `values`. Values that
/// serialize to an empty mapping produce an empty string.
pub fn dump_frontmatter<T: Serialize>(values: &T) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(values)?;
    let yaml = yaml.trim_end();
    if yaml.is_empty() || yaml == "{}" {
        return Ok(String::new());
    }
    Ok(format!("---\n{yaml}\n---\n\n"))
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extract_nested_frontmatter() {
        let doc = "---\nskill:\n  target: skills/foo\n  name: Foo\nmetadata:\n  priority: 3\n---\n\nBody\n";
        let fm = extract_frontmatter(doc).unwrap().unwrap();

        assert_eq!(
            fm.get("skill"),
            Some(&json!({"target": "skills/foo", "name": "Foo"}))
        );
        assert_eq!(fm.get("metadata"), Some(&json!({"priority": 3})));
        assert_eq!(fm.body, "Body\n");
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(extract_frontmatter("# Title\n").unwrap().is_none());
        assert!(extract_frontmatter("#! target: a.md\nBody").unwrap().is_none());
        assert!(extract_frontmatter("---\nunterminated: true\n").unwrap().is_none());
    }

    #[test]
    fn test_empty_block_is_empty_map() {
        let fm = extract_frontmatter("---\n---\nBody").unwrap().unwrap();
        assert!(fm.is_empty());
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn test_invalid_frontmatter() {
        let err = extract_frontmatter("---\nkey: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidYaml(_)));

        let err = extract_frontmatter("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::NotAMapping { found: "list" }));
    }

    #[test]
    fn test_dump_preserves_field_order() {
        #[derive(Serialize)]
        struct SkillHeader<'a> {
            name: &'a str,
            description: &'a str,
        }

        let out = dump_frontmatter(&SkillHeader {
            name: "Foo",
            description: "desc",
        })
        .unwrap();
        assert_eq!(out, "---\nname: Foo\ndescription: desc\n---\n\n");
    }

    #[test]
    fn test_dump_empty_mapping() {
        assert_eq!(dump_frontmatter(&Map::new()).unwrap(), "");
    }
}
