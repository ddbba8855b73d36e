//! UPDATE vs REPLACE selection.
//!
//! The engine updates fixed-width attributes in place but cannot change a
//! string, JSON or full-text value with UPDATE. A single-row update that
//! writes one of those is compiled as a `REPLACE INTO` of the whole document.

use tracing::debug;

use crate::error::{SphinxResult, ValidationError};
use crate::schema::ModelMeta;
use crate::types::{Lookup, Query, Value, WhereChild};

use super::base::{BaseCompiler, write_value};
use super::fragment::CompiledStatement;

/// How an update is compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateStrategy {
    /// In-place `UPDATE ... SET`.
    Update,
    /// Full-row `REPLACE INTO` of the document with this primary key.
    Replace {
        /// Primary key of the document.
        pk: Value,
    },
}

/// Chooses the strategy for an update query.
pub fn select_strategy(meta: &dyn ModelMeta, query: &Query) -> UpdateStrategy {
    let Some(pk) = single_row_pk(meta, query) else {
        return UpdateStrategy::Update;
    };
    let writes_variable_length = query.values.iter().any(|(name, _)| {
        meta.field(name)
            .is_some_and(|f| f.kind.is_variable_length())
    });
    if writes_variable_length {
        UpdateStrategy::Replace { pk }
    } else {
        UpdateStrategy::Update
    }
}

/// Returns the primary key when the query addresses exactly one document.
///
/// That is a lone, non-negated `pk=value` filter, or otherwise a primary-key
/// match bucket holding a single term.
pub fn single_row_pk(meta: &dyn ModelMeta, query: &Query) -> Option<Value> {
    let pk_field = meta.primary_key_field()?;

    if let [WhereChild::Filter(filter)] = query.filters.children.as_slice() {
        if query.filters.negated || filter.negated {
            return None;
        }
        let (name, lookup) = filter.parse_key().ok()?;
        let field = meta.field(name)?;
        return (lookup == Lookup::Exact && field.primary_key).then(|| filter.value.clone());
    }

    if !query.filters.is_empty() {
        return None;
    }

    let bucket = query.match_spec.fields().iter().find(|b| {
        meta.field(&b.field)
            .is_some_and(|f| f.name == pk_field.name)
    })?;
    match bucket.terms.as_slice() {
        [term] => term_to_value(term),
        _ => None,
    }
}

/// Reads a match term as a key value.
///
/// Only a bare, optionally quoted key pins a row. Exclusions (`-7`),
/// prefixes and other match expressions do not.
fn term_to_value(term: &str) -> Option<Value> {
    let bare = term.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap_or(term);
    let is_key = !bare.is_empty() && bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_key {
        return None;
    }
    Some(
        bare.parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(bare.to_string())),
    )
}

/// Compiles a single-row update as `REPLACE INTO`.
///
/// Every schema column is written, in schema order. A value is taken from
/// the primary key, the written values, the current row, then the field
/// default.
///
/// REPLACE takes no OPTION clause, so a query carrying options is rejected
/// rather than compiled without them.
pub fn compile_replace(
    meta: &dyn ModelMeta,
    query: &Query,
    pk: &Value,
) -> SphinxResult<CompiledStatement> {
    if query.values.is_empty() {
        return Ok(CompiledStatement::empty());
    }
    for (name, _) in &query.values {
        meta.require_field(name)?;
    }
    let table = BaseCompiler::new(meta).table(query)?;
    if !query.options.is_empty() {
        return Err(ValidationError::OptionsNotAllowed {
            statement: "REPLACE".to_string(),
        }
        .into());
    }

    let lookup = |pairs: Option<&Vec<(String, Value)>>, name: &str| -> Option<Value> {
        pairs?
            .iter()
            .rev()
            .find(|(n, _)| n == name || meta.field(n).is_some_and(|f| f.name == name))
            .map(|(_, v)| v.clone())
    };

    let mut columns = Vec::new();
    let mut values = Vec::new();
    let mut missing = Vec::new();
    for field in meta.fields() {
        let value = if field.primary_key {
            Some(pk.clone())
        } else {
            lookup(Some(&query.values), &field.name)
                .or_else(|| lookup(query.current_row.as_ref(), &field.name))
                .or_else(|| field.default.clone())
        };
        match value {
            Some(value) => {
                columns.push(field.column());
                values.push((field, value));
            }
            None => missing.push(field.name.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(ValidationError::IncompleteRow { table, missing }.into());
    }

    let mut params = Vec::new();
    let mut rendered = Vec::with_capacity(values.len());
    for (field, value) in values {
        rendered.push(write_value(field, &value, &mut params)?);
    }

    debug!(table = %table, pk = ?pk, "single-row update compiled as REPLACE");

    Ok(CompiledStatement {
        sql: format!(
            "REPLACE INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            rendered.join(", ")
        ),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SphinxError;
    use crate::schema::{FieldDef, FieldKind, IndexSchema};
    use crate::types::SqlValue;

    fn schema() -> IndexSchema {
        IndexSchema::new(
            "testapp_testmodel",
            vec![
                FieldDef::id(),
                FieldDef::new("sphinx_field", FieldKind::Text),
                FieldDef::new("attr_uint", FieldKind::Integer).with_default(0),
                FieldDef::new("attr_string", FieldKind::String),
            ],
        )
    }

    #[test]
    fn test_integer_update_stays_update() {
        let q = Query::update().filter("pk", 1).set("attr_uint", 5);
        assert_eq!(select_strategy(&schema(), &q), UpdateStrategy::Update);
    }

    #[test]
    fn test_string_update_on_single_row_replaces() {
        let q = Query::update().filter("id", 1).set("attr_string", "x");
        assert_eq!(
            select_strategy(&schema(), &q),
            UpdateStrategy::Replace {
                pk: Value::Integer(1)
            }
        );
    }

    #[test]
    fn test_multi_row_string_update_stays_update() {
        let q = Query::update()
            .filter("attr_uint__gt", 1)
            .set("attr_string", "x");
        assert_eq!(select_strategy(&schema(), &q), UpdateStrategy::Update);

        let q = Query::update()
            .filter("id", 1)
            .filter("attr_uint", 1)
            .set("attr_string", "x");
        assert_eq!(select_strategy(&schema(), &q), UpdateStrategy::Update);
    }

    #[test]
    fn test_negated_pk_is_not_single_row() {
        let q = Query::update().exclude("id", 1).set("attr_string", "x");
        assert_eq!(single_row_pk(&schema(), &q), None);
    }

    #[test]
    fn test_pk_from_match_bucket() {
        let q = Query::update().match_field("id", ["7"]);
        assert_eq!(single_row_pk(&schema(), &q), Some(Value::Integer(7)));

        let q = Query::update().match_field("id", ["7", "8"]);
        assert_eq!(single_row_pk(&schema(), &q), None);

        let q = Query::update().match_field("id", ["\"7\""]);
        assert_eq!(single_row_pk(&schema(), &q), Some(Value::Integer(7)));
    }

    #[test]
    fn test_excluded_pk_term_is_not_single_row() {
        let q = Query::update()
            .match_field("id", ["-7"])
            .set("attr_string", "x");
        assert_eq!(single_row_pk(&schema(), &q), None);
        assert_eq!(select_strategy(&schema(), &q), UpdateStrategy::Update);

        for term in ["7*", "7 | 8", "-\"7\"", ""] {
            let q = Query::update().match_field("id", [term]);
            assert_eq!(single_row_pk(&schema(), &q), None, "term {term:?}");
        }
    }

    #[test]
    fn test_replace_rejects_options() {
        let s = schema();
        let q = Query::update()
            .filter("id", 1)
            .set("attr_string", "new")
            .set("sphinx_field", "t")
            .option("max_matches", 5);
        let err = compile_replace(&s, &q, &Value::Integer(1)).unwrap_err();
        assert!(matches!(
            err,
            SphinxError::Validation(ValidationError::OptionsNotAllowed { .. })
        ));
    }

    #[test]
    fn test_replace_lists_every_column() {
        let s = schema();
        let q = Query::update()
            .filter("id", 1)
            .set("attr_string", "new")
            .with_current_row(vec![
                ("sphinx_field".to_string(), Value::from("body")),
                ("attr_string".to_string(), Value::from("old")),
            ]);
        let stmt = compile_replace(&s, &q, &Value::Integer(1)).unwrap();
        assert_eq!(
            stmt.sql,
            "REPLACE INTO testapp_testmodel (id, sphinx_field, attr_uint, attr_string) VALUES (%s, %s, %s, %s)"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Integer(1),
                SqlValue::string("body"),
                SqlValue::Integer(0),
                SqlValue::string("new"),
            ]
        );
    }

    #[test]
    fn test_replace_missing_columns() {
        let s = schema();
        let q = Query::update().filter("id", 1).set("attr_string", "new");
        let err = compile_replace(&s, &q, &Value::Integer(1)).unwrap_err();
        match err {
            SphinxError::Validation(ValidationError::IncompleteRow { missing, .. }) => {
                assert_eq!(missing, vec!["sphinx_field".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_replace_null_is_literal() {
        let s = schema();
        let q = Query::update()
            .filter("id", 1)
            .set("attr_string", Value::Null)
            .set("sphinx_field", "t");
        let stmt = compile_replace(&s, &q, &Value::Integer(1)).unwrap();
        assert!(stmt.sql.ends_with("VALUES (%s, %s, %s, NULL)"));
    }
}
