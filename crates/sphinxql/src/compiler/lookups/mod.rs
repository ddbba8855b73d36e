//! Per-class lookup handlers.
//!
//! Each handler turns one `(field, lookup, value)` triple into either a SQL
//! condition or full-text match terms. Dispatch is a closed match over the
//! field's [`FieldClass`] and the [`Lookup`].

mod fulltext;
mod multi;
mod scalar;

pub use fulltext::FullTextHandler;
pub use multi::MultiValueHandler;
pub use scalar::ScalarHandler;

use crate::error::{SphinxResult, ValidationError};
use crate::schema::{FieldClass, FieldDef};
use crate::types::{Lookup, StatementKind, Value};

use super::fragment::SqlFragment;

/// What a filter was rewritten into.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewritten {
    /// Generic predicate the base compiler renders as-is.
    Predicate(SqlFragment),
    /// Engine-native condition such as `IN(col, ...)` or `col <> %s`.
    Raw(SqlFragment),
    /// Terms folded into the match specification of a full-text field.
    MatchTerms {
        /// Field name.
        field: String,
        /// Escaped terms, `-` prefixed when negated.
        terms: Vec<String>,
    },
}

/// Rewrites one filter.
pub fn rewrite(
    field: &FieldDef,
    lookup: Lookup,
    value: &Value,
    negated: bool,
    statement: StatementKind,
) -> SphinxResult<Rewritten> {
    use Lookup::*;

    let rewritten = match (field.kind.class(), lookup) {
        (FieldClass::FullText, Exact | In | Search | StartsWith) => {
            FullTextHandler::build_terms(field, lookup, value, negated)?
        }
        (FieldClass::Multi, Exact | In | Gt | Gte | Lt | Lte | Range) => {
            MultiValueHandler::build_sql(field, lookup, value, negated, statement)?
        }
        (FieldClass::Scalar | FieldClass::StringAttr, Exact | In | Gt | Gte | Lt | Lte | Range) => {
            ScalarHandler::build_sql(field, lookup, value, negated)?
        }
        (_, lookup) => {
            return Err(ValidationError::UnsupportedLookup {
                field: field.name.clone(),
                lookup: lookup.as_str().to_string(),
                kind: field.kind,
            }
            .into());
        }
    };
    Ok(rewritten)
}

/// Returns the list items of a membership value, rejecting an empty list.
fn membership_items<'a>(
    field: &FieldDef,
    lookup: Lookup,
    value: &'a Value,
) -> Result<Vec<&'a Value>, ValidationError> {
    let items = value.as_items();
    if items.is_empty() {
        return Err(ValidationError::EmptyMembership {
            field: field.name.clone(),
            lookup: lookup.as_str().to_string(),
        });
    }
    Ok(items)
}

/// Returns the two bounds of a `range` value.
fn range_bounds<'a>(
    field: &FieldDef,
    value: &'a Value,
) -> Result<(&'a Value, &'a Value), ValidationError> {
    match value {
        Value::List(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        Value::List(items) => Err(ValidationError::InvalidRange {
            field: field.name.clone(),
            count: items.len(),
        }),
        _ => Err(ValidationError::InvalidRange {
            field: field.name.clone(),
            count: 1,
        }),
    }
}
