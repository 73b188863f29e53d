/*
 * variable.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scanner for inline variables: `{{name}}`.
//!
//! Uses the same strategy as the snippet scanner but accepts only the bare
//! form. A name may not contain `:` or whitespace, so `{{name: arg}}` is
//! never mistaken for a variable.

use crate::snippet::take_while;
use crate::span::{Span, Spanned, is_close_at, is_open_at, is_space, skip_space};

/// One `{{name}}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

impl Spanned for Variable {
    fn span(&self) -> Span {
        self.span
    }
}

/// Find every variable in `text`, in source order.
pub fn parse_variables(text: &str) -> Vec<Variable> {
    let bytes = text.as_bytes();
    let mut variables = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if is_open_at(bytes, i) {
            if let Some(variable) = parse_one(text, i) {
                i = variable.span.end;
                variables.push(variable);
                continue;
            }
        }
        i += 1;
    }

    variables
}

fn parse_one(text: &str, start: usize) -> Option<Variable> {
    let bytes = text.as_bytes();
    let mut pos = start + 2;

    skip_space(bytes, &mut pos);
    let name = take_while(text, &mut pos, |b| b != b'}' && b != b':' && !is_space(b))?;
    skip_space(bytes, &mut pos);

    if !is_close_at(bytes, pos) {
        return None;
    }

    Some(Variable {
        name: name.to_string(),
        span: Span::new(start, pos + 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_variables() {
        let text = "Hello {{name}}, welcome to {{ place }}!";
        let variables = parse_variables(text);

        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].name, "name");
        assert_eq!(variables[0].span.slice(text), "{{name}}");
        assert_eq!(variables[1].name, "place");
        assert_eq!(variables[1].span.slice(text), "{{ place }}");
    }

    #[test]
    fn test_snippets_with_arguments_are_not_variables() {
        assert!(parse_variables("{{include: a.md}}").is_empty());
        assert!(parse_variables("{{include:a.md}}").is_empty());
        assert!(parse_variables("{{dump: A, B}}").is_empty());
    }

    #[test]
    fn test_empty_or_whitespace_names_are_rejected() {
        assert!(parse_variables("{{}}").is_empty());
        assert!(parse_variables("{{   }}").is_empty());
        assert_eq!(parse_variables("{{ }} {{x}}").len(), 1);
    }

    #[test]
    fn test_unclosed_variable() {
        assert!(parse_variables("{{name").is_empty());
        assert!(parse_variables("{{name }").is_empty());
    }
}
