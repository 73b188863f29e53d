/*
 * snippet.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scanner for inline snippets: `{{name}}` and `{{name: arg, "quoted arg"}}`.
//!
//! The scanner never fails. A `{{` that does not start a well-formed snippet
//! is skipped by one byte and scanning continues, so malformed snippets stay
//! in the text untouched.

use crate::span::{Span, Spanned, is_close_at, is_open_at, is_space, skip_space};

/// One `{{name: args}}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub name: String,
    /// Empty when the snippet has no `:`.
    pub arguments: Vec<String>,
    pub span: Span,
}

impl Spanned for Snippet {
    fn span(&self) -> Span {
        self.span
    }
}

/// Find every snippet in `text`, in source order.
pub fn parse_snippets(text: &str) -> Vec<Snippet> {
    let bytes = text.as_bytes();
    let mut snippets = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if is_open_at(bytes, i) {
            if let Some(snippet) = parse_one(text, i) {
                i = snippet.span.end;
                snippets.push(snippet);
                continue;
            }
        }
        i += 1;
    }

    snippets
}

fn parse_one(text: &str, start: usize) -> Option<Snippet> {
    let bytes = text.as_bytes();
    let mut pos = start + 2;

    skip_space(bytes, &mut pos);
    let name = take_while(text, &mut pos, |b| b != b':' && b != b'}' && !is_space(b))?;
    skip_space(bytes, &mut pos);

    let mut arguments = Vec::new();
    if pos < bytes.len() && bytes[pos] == b':' {
        pos += 1;
        arguments = parse_arguments(text, &mut pos);
    }

    skip_space(bytes, &mut pos);
    if !is_close_at(bytes, pos) {
        return None;
    }

    Some(Snippet {
        name: name.to_string(),
        arguments,
        span: Span::new(start, pos + 2),
    })
}

fn parse_arguments(text: &str, pos: &mut usize) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut arguments = Vec::new();

    while *pos < bytes.len() {
        skip_space(bytes, pos);
        if *pos >= bytes.len() || is_close_at(bytes, *pos) {
            break;
        }

        if let Some(argument) = parse_argument(text, pos) {
            arguments.push(argument.to_string());
        }

        skip_space(bytes, pos);
        if *pos < bytes.len() && bytes[*pos] == b',' {
            *pos += 1;
        } else {
            break;
        }
    }

    arguments
}

fn parse_argument<'a>(text: &'a str, pos: &mut usize) -> Option<&'a str> {
    let bytes = text.as_bytes();

    if bytes.get(*pos) == Some(&b'"') {
        *pos += 1;
        let start = *pos;
        while *pos < bytes.len() && bytes[*pos] != b'"' {
            *pos += 1;
        }
        if *pos >= bytes.len() {
            // Unterminated quote; the closing `}}` check will reject the snippet.
            return None;
        }
        let argument = &text[start..*pos];
        *pos += 1;
        return Some(argument);
    }

    take_while(text, pos, |b| b != b',' && b != b'}' && !is_space(b))
}

/// Consume a non-empty run of bytes satisfying `accept`.
pub(crate) fn take_while<'a>(
    text: &'a str,
    pos: &mut usize,
    accept: impl Fn(u8) -> bool,
) -> Option<&'a str> {
    let bytes = text.as_bytes();
    let start = *pos;
    while *pos < bytes.len() && accept(bytes[*pos]) {
        *pos += 1;
    }
    (*pos > start).then(|| &text[start..*pos])
}
