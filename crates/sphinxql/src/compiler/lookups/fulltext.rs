//! Full-text field lookups, folded into MATCH terms.

use crate::compiler::escape::escape;
use crate::error::SphinxResult;
use crate::schema::FieldDef;
use crate::types::{Lookup, Value};

use super::{Rewritten, membership_items};

/// Handles lookups on full-text fields.
pub struct FullTextHandler;

impl FullTextHandler {
    /// Builds escaped match terms for `exact`, `in`, `search` and `startswith`.
    pub fn build_terms(
        field: &FieldDef,
        lookup: Lookup,
        value: &Value,
        negated: bool,
    ) -> SphinxResult<Rewritten> {
        let values = match lookup {
            Lookup::In => membership_items(field, lookup, value)?,
            _ => vec![value],
        };

        let terms = values
            .into_iter()
            .map(|v| Self::term(&v.to_text(), lookup, negated))
            .collect();

        Ok(Rewritten::MatchTerms {
            field: field.name.clone(),
            terms,
        })
    }

    fn term(text: &str, lookup: Lookup, negated: bool) -> String {
        let mut term = escape(text);
        if lookup == Lookup::StartsWith {
            term.push('*');
        }
        if negated {
            term.insert(0, '-');
        }
        term
    }
}
