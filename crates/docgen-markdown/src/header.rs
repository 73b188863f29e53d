/*
 * header.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document-level `name: value` headers.
//!
//! Two block forms are recognized at the top of a document:
//!
//! - a `---` delimited block with one `key: value` pair per line
//! - the legacy form, where every header line starts with `#!`
//!
//! In both forms the returned content never includes the header block and
//! leading blank lines after the block are removed. A document without a
//! complete block is returned unchanged with no headers.
//!
//! Header values are normalized after the block is read:
//!
//! - `key[0]: x` collapses to the name `key`
//! - a value written as a JSON array (`["a", "b"]`) expands into one header
//!   per element; a JSON string (`"a b"`) is decoded
//! - a header whose name starts with `$` is a variable: it is removed from
//!   the result and every occurrence of its name in the remaining values is
//!   replaced by its value

use serde_json::Value;

use crate::error::HeaderError;

/// One document-level fact, such as `target: docs/out.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Headers of a document plus its body with the header block removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub headers: Vec<Header>,
    pub content: String,
}

impl ParsedHeaders {
    /// All headers with the given name, in declaration order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |h| h.name == name)
    }

    pub fn first(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first(name).is_some()
    }
}

/// Which block form a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    Frontmatter,
    Legacy,
}

pub(crate) struct HeaderBlock<'a> {
    pub form: HeaderForm,
    pub lines: Vec<&'a str>,
    pub body: &'a str,
}

/// Parse the header block of `content`.
pub fn parse_headers(content: &str) -> Result<ParsedHeaders, HeaderError> {
    let Some(block) = locate_block(content) else {
        return Ok(ParsedHeaders {
            headers: Vec::new(),
            content: content.to_string(),
        });
    };

    let raw: Vec<Header> = block.lines.iter().copied().filter_map(parse_line).collect();

    Ok(ParsedHeaders {
        headers: substitute_variables(expand(raw)?),
        content: block.body.to_string(),
    })
}

/// Return the body of `content` with any header block removed, without
/// interpreting header values.
pub fn strip_headers(content: &str) -> &str {
    match locate_block(content) {
        Some(block) => block.body,
        None => content,
    }
}

/// Detect which header form `content` starts with, if any.
pub fn header_form(content: &str) -> Option<HeaderForm> {
    locate_block(content).map(|b| b.form)
}

pub(crate) fn locate_block(content: &str) -> Option<HeaderBlock<'_>> {
    let mut lines = lines_with_end(content);
    let (first, _) = lines.next()?;

    if first.trim() == "---" {
        let mut block = Vec::new();
        for (line, end) in lines {
            if line.trim() == "---" {
                return Some(HeaderBlock {
                    form: HeaderForm::Frontmatter,
                    lines: block,
                    body: strip_leading_blank_lines(&content[end..]),
                });
            }
            block.push(line);
        }
        return None;
    }

    let mut block = Vec::new();
    let mut body_start = 0;
    for (line, end) in lines_with_end(content) {
        if line.trim().is_empty() {
            continue;
        }
        match line.strip_prefix("#!") {
            Some(rest) => {
                block.push(rest);
                body_start = end;
            }
            None => break,
        }
    }

    if block.is_empty() {
        return None;
    }

    Some(HeaderBlock {
        form: HeaderForm::Legacy,
        lines: block,
        body: strip_leading_blank_lines(&content[body_start..]),
    })
}

/// Lines without their terminator, paired with the byte offset just past
/// the terminator.
fn lines_with_end(text: &str) -> impl Iterator<Item = (&str, usize)> {
    let mut end = 0;
    text.split_inclusive('\n').map(move |segment| {
        end += segment.len();
        (segment.trim_end_matches(['\n', '\r']), end)
    })
}

fn strip_leading_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for (line, end) in lines_with_end(text) {
        if !line.trim().is_empty() {
            break;
        }
        start = end;
    }
    &text[start..]
}

fn parse_line(line: &str) -> Option<Header> {
    let (name, value) = line.trim().split_once(':')?;
    let name = normalize_name(name.trim());
    let value = value.trim();

    if name.is_empty() || value.is_empty() {
        return None;
    }

    Some(Header::new(name, value))
}

fn normalize_name(name: &str) -> &str {
    match name.find('[') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

fn expand(headers: Vec<Header>) -> Result<Vec<Header>, HeaderError> {
    let mut out = Vec::with_capacity(headers.len());

    for header in headers {
        let v = header.value.as_str();
        let encoded =
            (v.starts_with('[') && v.ends_with(']')) || (v.starts_with('"') && v.ends_with('"'));
        if !encoded {
            out.push(header);
            continue;
        }

        let decoded: Value =
            serde_json::from_str(v).map_err(|e| HeaderError::InvalidValue {
                name: header.name.clone(),
                value: header.value.clone(),
                message: e.to_string(),
            })?;

        match decoded {
            Value::Array(items) => {
                for item in items {
                    out.push(Header::new(&header.name, scalar_to_string(&header.name, item)?));
                }
            }
            other => out.push(Header::new(&header.name, scalar_to_string(&header.name, other)?)),
        }
    }

    Ok(out)
}

fn scalar_to_string(name: &str, value: Value) -> Result<String, HeaderError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        Value::Array(_) | Value::Object(_) => Err(HeaderError::NonScalarValue {
            name: name.to_string(),
        }),
    }
}

fn substitute_variables(headers: Vec<Header>) -> Vec<Header> {
    let (variables, mut headers): (Vec<Header>, Vec<Header>) =
        headers.into_iter().partition(|h| h.name.starts_with('$'));

    for variable in &variables {
        for header in headers.iter_mut() {
            if header.value.contains(&variable.name) {
                header.value = header.value.replace(&variable.name, &variable.value);
            }
        }
    }

    headers
}
