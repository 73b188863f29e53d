/*
 * span.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Byte spans and span-based splicing.

/// A half-open `[start, end)` byte range into one specific text buffer.
///
/// Spans are only meaningful for the buffer they were computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The text covered by this span.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Anything that occupies a span of its source buffer.
pub trait Spanned {
    fn span(&self) -> Span;
}

/// Replace spanned items in `text`.
///
/// `replace` is called once per item in reverse source order (highest start
/// first). Returning `Ok(None)` keeps the item's text verbatim. The output is
/// assembled into a fresh buffer, so text between items is preserved
/// byte-for-byte and in order regardless of replacement lengths.
///
/// Items must be in source order and must not overlap, which is what the
/// scanners in this crate produce.
pub fn splice<T, E, F>(text: &str, items: &[T], mut replace: F) -> Result<String, E>
where
    T: Spanned,
    F: FnMut(&T) -> Result<Option<String>, E>,
{
    if items.is_empty() {
        return Ok(text.to_string());
    }

    let mut replacements: Vec<Option<String>> = Vec::with_capacity(items.len());
    for item in items.iter().rev() {
        replacements.push(replace(item)?);
    }
    replacements.reverse();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (item, replacement) in items.iter().zip(replacements) {
        let span = item.span();
        out.push_str(&text[cursor..span.start]);
        match replacement {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(span.slice(text)),
        }
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    Ok(out)
}

/// Whitespace as recognized by the scanners (space, tab, newline, carriage
/// return, vertical tab, form feed).
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

pub(crate) fn skip_space(bytes: &[u8], pos: &mut usize) {
    while *pos < bytes.len() && is_space(bytes[*pos]) {
        *pos += 1;
    }
}

pub(crate) fn is_open_at(bytes: &[u8], pos: usize) -> bool {
    pos + 1 < bytes.len() && bytes[pos] == b'{' && bytes[pos + 1] == b'{'
}

pub(crate) fn is_close_at(bytes: &[u8], pos: usize) -> bool {
    pos + 1 < bytes.len() && bytes[pos] == b'}' && bytes[pos + 1] == b'}'
}
