//! Multi-value attribute lookups.
//!
//! Membership renders the engine's `IN(col, v1, v2)` function. Comparisons
//! test the smallest or largest element with `LEAST()` / `GREATEST()`.

use crate::compiler::fragment::{SqlFragment, placeholders};
use crate::error::{SphinxResult, TypeError, ValidationError};
use crate::schema::FieldDef;
use crate::types::{Lookup, SqlValue, StatementKind, Value};

use super::{Rewritten, membership_items, range_bounds};

/// Handles lookups on multi-value attributes.
pub struct MultiValueHandler;

impl MultiValueHandler {
    /// Builds the raw condition for a multi-value lookup.
    pub fn build_sql(
        field: &FieldDef,
        lookup: Lookup,
        value: &Value,
        negated: bool,
        statement: StatementKind,
    ) -> SphinxResult<Rewritten> {
        let column = field.column();
        let fragment = match lookup {
            Lookup::Exact | Lookup::In => {
                let params = membership_items(field, lookup, value)?
                    .into_iter()
                    .map(|item| Self::element(field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                let sql = if statement == StatementKind::Delete {
                    format!("{} IN ({})", column, placeholders(params.len()))
                } else {
                    format!("IN({}, {})", column, placeholders(params.len()))
                };
                SqlFragment::with_params(sql, params)
            }
            Lookup::Gt | Lookup::Gte => Self::compare("LEAST", field, lookup, value)?,
            Lookup::Lt | Lookup::Lte => Self::compare("GREATEST", field, lookup, value)?,
            Lookup::Range => {
                let (low, high) = range_bounds(field, value)?;
                Self::compare("LEAST", field, Lookup::Gte, low)?.and(Self::compare(
                    "GREATEST",
                    field,
                    Lookup::Lte,
                    high,
                )?)
            }
            Lookup::Search | Lookup::StartsWith => {
                return Err(ValidationError::UnsupportedLookup {
                    field: field.name.clone(),
                    lookup: lookup.as_str().to_string(),
                    kind: field.kind,
                }
                .into());
            }
        };

        Ok(Rewritten::Raw(if negated {
            fragment.negate()
        } else {
            fragment
        }))
    }

    fn compare(
        function: &str,
        field: &FieldDef,
        lookup: Lookup,
        value: &Value,
    ) -> Result<SqlFragment, TypeError> {
        let op = lookup.comparison_operator().unwrap_or("=");
        Ok(SqlFragment::with_params(
            format!("{}({}) {} %s", function, field.column(), op),
            vec![Self::element(field, value)?],
        ))
    }

    /// A single element of a multi-value attribute must be an integer.
    fn element(field: &FieldDef, value: &Value) -> Result<SqlValue, TypeError> {
        match value {
            Value::Integer(i) => Ok(SqlValue::Integer(*i)),
            Value::Text(s) => s
                .trim()
                .parse()
                .map(SqlValue::Integer)
                .map_err(|_| Self::not_integer(field, value)),
            other => Err(Self::not_integer(field, other)),
        }
    }

    fn not_integer(field: &FieldDef, value: &Value) -> TypeError {
        TypeError::NotPreparable {
            field: field.name.clone(),
            expected: field.kind,
            found: value.kind_name(),
        }
    }
}
