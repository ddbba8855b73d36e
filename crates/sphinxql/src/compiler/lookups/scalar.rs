//! Scalar and string attribute lookups.

use crate::compiler::fragment::{SqlFragment, placeholders};
use crate::error::{SphinxResult, ValidationError};
use crate::schema::FieldDef;
use crate::types::{Lookup, Value};

use super::{Rewritten, membership_items, range_bounds};

/// Handles lookups on fixed-width and string attributes.
pub struct ScalarHandler;

impl ScalarHandler {
    /// Builds the condition for a scalar lookup.
    ///
    /// Plain forms are generic predicates. Negated `exact` and `in` have no
    /// `NOT (...)` form on the engine and become raw `<>` / `NOT IN`
    /// conditions. Negated comparisons flip the operator.
    pub fn build_sql(
        field: &FieldDef,
        lookup: Lookup,
        value: &Value,
        negated: bool,
    ) -> SphinxResult<Rewritten> {
        let column = field.column();
        match lookup {
            Lookup::Exact => {
                let param = field.prepare(value)?;
                let op = if negated { "<>" } else { "=" };
                let fragment = SqlFragment::with_params(format!("{} {} %s", column, op), vec![param]);
                Ok(if negated {
                    Rewritten::Raw(fragment)
                } else {
                    Rewritten::Predicate(fragment)
                })
            }
            Lookup::In => {
                let params = membership_items(field, lookup, value)?
                    .into_iter()
                    .map(|item| field.prepare(item))
                    .collect::<Result<Vec<_>, _>>()?;
                let op = if negated { "NOT IN" } else { "IN" };
                let fragment = SqlFragment::with_params(
                    format!("{} {} ({})", column, op, placeholders(params.len())),
                    params,
                );
                Ok(if negated {
                    Rewritten::Raw(fragment)
                } else {
                    Rewritten::Predicate(fragment)
                })
            }
            Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => {
                let effective = if negated {
                    lookup.inverted().unwrap_or(lookup)
                } else {
                    lookup
                };
                let op = effective.comparison_operator().unwrap_or("=");
                Ok(Rewritten::Predicate(SqlFragment::with_params(
                    format!("{} {} %s", column, op),
                    vec![field.prepare(value)?],
                )))
            }
            Lookup::Range => {
                if negated {
                    return Err(ValidationError::NegatedLookup {
                        field: field.name.clone(),
                        lookup: lookup.as_str().to_string(),
                    }
                    .into());
                }
                let (low, high) = range_bounds(field, value)?;
                Ok(Rewritten::Predicate(SqlFragment::with_params(
                    format!("{} BETWEEN %s AND %s", column),
                    vec![field.prepare(low)?, field.prepare(high)?],
                )))
            }
            Lookup::Search | Lookup::StartsWith => Err(ValidationError::UnsupportedLookup {
                field: field.name.clone(),
                lookup: lookup.as_str().to_string(),
                kind: field.kind,
            }
            .into()),
        }
    }
}
