//! MATCH() expression serialization.

use crate::error::ValidationError;
use crate::schema::ModelMeta;
use crate::types::MatchSpec;

use super::fragment::escape_percent;

/// Quotes a term as a phrase.
///
/// Terms already starting with `"` pass through. A leading `-` is kept only
/// when `keep_negation` is set, so that the caller can group negated terms
/// under a single `-(...)`.
pub fn quote(term: &str, keep_negation: bool) -> String {
    if term.starts_with('"') {
        return term.to_string();
    }
    let Some(rest) = term.strip_prefix('-') else {
        return format!("\"{}\"", term);
    };
    let prefix = if keep_negation { "-" } else { "" };
    if rest.starts_with('"') {
        format!("{}{}", prefix, rest)
    } else {
        format!("{}\"{}\"", prefix, rest)
    }
}

/// Serializes terms into a match expression.
///
/// ```text
/// ["a", "b", "-c"]  ->  "a"|"b" -"c"
/// ["-a", "-b"]      ->  -("a"|"b")
/// ```
pub fn serialize<S: AsRef<str>>(terms: &[S]) -> String {
    let (negative, positive): (Vec<&str>, Vec<&str>) = terms
        .iter()
        .map(AsRef::as_ref)
        .partition(|t| t.starts_with('-'));

    let positive = positive
        .iter()
        .map(|t| quote(t, true))
        .collect::<Vec<_>>()
        .join("|");

    let result = if positive.is_empty() {
        if negative.is_empty() {
            return String::new();
        }
        let negative = negative
            .iter()
            .map(|t| quote(t, false))
            .collect::<Vec<_>>()
            .join("|");
        format!("-({})", negative.trim())
    } else {
        let negative = negative
            .iter()
            .map(|t| quote(t, true))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} {}", positive.trim(), negative.trim())
    };
    result.trim().to_string()
}

/// Renders the `MATCH('...')` clause, or `None` for an empty specification.
pub fn render_clause(
    spec: &MatchSpec,
    meta: &dyn ModelMeta,
) -> Result<Option<String>, ValidationError> {
    if spec.is_empty() {
        return Ok(None);
    }

    let mut expression: Vec<String> = spec.all().to_vec();
    for bucket in spec.fields() {
        if bucket.terms.is_empty() {
            continue;
        }
        let field = meta.require_field(&bucket.field)?;
        expression.push(format!("@{}", field.column()));
        expression.push(format!("({})", serialize(&bucket.terms)));
    }

    Ok(Some(format!(
        "MATCH('{}')",
        escape_percent(&expression.join(" "))
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind, IndexSchema};

    fn schema() -> IndexSchema {
        IndexSchema::new(
            "testapp_testmodel",
            vec![
                FieldDef::id(),
                FieldDef::new("sphinx_field", FieldKind::Text),
                FieldDef::new("other", FieldKind::Text).with_column("other_field"),
            ],
        )
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a", true), "\"a\"");
        assert_eq!(quote("\"a b\"", true), "\"a b\"");
        assert_eq!(quote("-a", true), "-\"a\"");
        assert_eq!(quote("-a", false), "\"a\"");
        assert_eq!(quote("-\"a b\"", true), "-\"a b\"");
        assert_eq!(quote("-\"a b\"", false), "\"a b\"");
    }

    #[test]
    fn test_serialize_all_positive() {
        let s = serialize(&["a", "b"]);
        assert_eq!(s, "\"a\"|\"b\"");
        assert!(!s.contains("-("));
    }

    #[test]
    fn test_serialize_all_negative() {
        assert_eq!(serialize(&["-a", "-b"]), "-(\"a\"|\"b\")");
    }

    #[test]
    fn test_serialize_mixed() {
        assert_eq!(
            serialize(&["a", "-c", "b", "-d"]),
            "\"a\"|\"b\" -\"c\" -\"d\""
        );
    }

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize::<&str>(&[]), "");
    }

    #[test]
    fn test_render_clause() {
        let mut spec = MatchSpec::new();
        spec.add_all("@* hello");
        spec.add_field("sphinx_field", ["a", "-b"]);
        spec.add_field("other", ["c"]);
        let clause = render_clause(&spec, &schema()).unwrap().unwrap();
        assert_eq!(
            clause,
            "MATCH('@* hello @sphinx_field (\"a\" -\"b\") @other_field (\"c\")')"
        );
    }

    #[test]
    fn test_render_clause_empty() {
        assert_eq!(render_clause(&MatchSpec::new(), &schema()).unwrap(), None);
    }

    #[test]
    fn test_render_clause_unknown_field() {
        let mut spec = MatchSpec::new();
        spec.add_field("missing", ["x"]);
        assert!(matches!(
            render_clause(&spec, &schema()),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_render_clause_doubles_percent() {
        let mut spec = MatchSpec::new();
        spec.add_field("sphinx_field", ["100%"]);
        let clause = render_clause(&spec, &schema()).unwrap().unwrap();
        assert_eq!(clause, "MATCH('@sphinx_field (\"100%%\")')");
    }
}
