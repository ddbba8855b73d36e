//! Full-text match specification.

/// Terms matched against one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBucket {
    /// Field name, resolved to a column when the clause is rendered.
    pub field: String,
    /// Terms in insertion order. A leading `-` negates a term.
    pub terms: Vec<String>,
}

/// What a query matches in the full-text index.
///
/// Wildcard expressions are raw engine syntax and are emitted verbatim.
/// Field buckets hold terms and are serialized. Adding to a selector that
/// already has terms unions them, keeping first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSpec {
    all: Vec<String>,
    fields: Vec<MatchBucket>,
}

impl MatchSpec {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw expression matched against all fields.
    pub fn add_all(&mut self, expression: impl Into<String>) {
        let expression = expression.into();
        if !self.all.contains(&expression) {
            self.all.push(expression);
        }
    }

    /// Adds terms matched against one field.
    pub fn add_field<I, S>(&mut self, field: &str, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = match self.fields.iter().position(|b| b.field == field) {
            Some(index) => index,
            None => {
                self.fields.push(MatchBucket {
                    field: field.to_string(),
                    terms: Vec::new(),
                });
                self.fields.len() - 1
            }
        };
        let bucket = &mut self.fields[index];
        for term in terms {
            let term = term.into();
            if !bucket.terms.contains(&term) {
                bucket.terms.push(term);
            }
        }
    }

    /// Unions another specification into this one.
    pub fn merge(&mut self, other: MatchSpec) {
        for expression in other.all {
            self.add_all(expression);
        }
        for bucket in other.fields {
            self.add_field(&bucket.field, bucket.terms);
        }
    }

    /// Raw wildcard expressions.
    pub fn all(&self) -> &[String] {
        &self.all
    }

    /// Field buckets in insertion order.
    pub fn fields(&self) -> &[MatchBucket] {
        &self.fields
    }

    /// Terms of one field bucket.
    pub fn bucket(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|b| b.field == field)
            .map(|b| b.terms.as_slice())
    }

    /// Returns true if nothing is matched.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.fields.iter().all(|b| b.terms.is_empty())
    }
}
