//! Escaping of literal text for MATCH() expressions.
//!
//! Every character the match grammar treats as an operator, and the
//! whole-word `SENTENCE` / `PARAGRAPH` operators, get the escape marker in
//! front. The marker is three backslashes: the SQL string literal keeps one
//! of them, and that one escapes the character for the match parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::SqlValue;

static SPECIAL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([=<>()|!@~&/^$\-'"\\])"#).expect("special character pattern is valid")
});

static OPERATOR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(SENTENCE|PARAGRAPH)\b").expect("operator word pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

const MARKER: &str = r"\\\";

/// Escapes text for literal use inside a MATCH() expression.
pub fn escape(text: &str) -> String {
    let replacement = format!("{}${{1}}", MARKER);
    let escaped = SPECIAL_CHARS.replace_all(text, replacement.as_str());
    OPERATOR_WORDS
        .replace_all(&escaped, replacement.as_str())
        .into_owned()
}

/// Escapes string values. Other values are returned unchanged.
pub fn escape_value(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::String(s) => SqlValue::String(escape(&s)),
        other => other,
    }
}

/// Returns true if `name` can be inlined into SQL as a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}
