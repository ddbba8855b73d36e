//! Predicate rewriting.
//!
//! Walks the predicate tree and moves every filter into exactly one of three
//! places: a generic predicate, an engine-native raw condition, or the match
//! specification. The tree is consumed, so no filter is seen twice.

use tracing::trace;

use crate::error::{SphinxResult, ValidationError};
use crate::schema::ModelMeta;
use crate::types::{Connector, Filter, MatchSpec, StatementKind, WhereChild, WhereNode};

use super::fragment::SqlFragment;
use super::lookups::{self, Rewritten};

/// A condition left for the WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Generic predicate.
    Predicate(SqlFragment),
    /// Engine-native condition.
    Raw(SqlFragment),
}

impl Condition {
    /// The underlying fragment.
    pub fn fragment(&self) -> &SqlFragment {
        match self {
            Condition::Predicate(f) | Condition::Raw(f) => f,
        }
    }

    fn into_fragment(self) -> SqlFragment {
        match self {
            Condition::Predicate(f) | Condition::Raw(f) => f,
        }
    }
}

/// The rewritten predicate tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteOutput {
    /// Conditions in tree order.
    pub conditions: Vec<Condition>,
    /// Match terms contributed by full-text filters.
    pub match_spec: MatchSpec,
}

impl RewriteOutput {
    /// Joins all conditions with AND.
    pub fn where_fragment(&self) -> SqlFragment {
        self.conditions
            .iter()
            .cloned()
            .map(Condition::into_fragment)
            .fold(SqlFragment::default(), SqlFragment::and)
    }
}

/// Rewrites predicate trees for one index.
pub struct Rewriter<'a> {
    meta: &'a dyn ModelMeta,
    statement: StatementKind,
}

impl<'a> Rewriter<'a> {
    /// Creates a rewriter for the given statement kind.
    pub fn new(meta: &'a dyn ModelMeta, statement: StatementKind) -> Self {
        Self { meta, statement }
    }

    /// Rewrites a predicate tree.
    pub fn rewrite(&self, node: WhereNode) -> SphinxResult<RewriteOutput> {
        let mut output = RewriteOutput::default();
        self.rewrite_node(node, false, &mut output)?;
        Ok(output)
    }

    fn rewrite_node(
        &self,
        node: WhereNode,
        outer_negated: bool,
        output: &mut RewriteOutput,
    ) -> SphinxResult<()> {
        if node.connector == Connector::Or {
            return Err(ValidationError::OrConnector.into());
        }
        let negated = outer_negated ^ node.negated;
        if negated && node.children.len() > 1 {
            return Err(ValidationError::NegatedGroup {
                children: node.children.len(),
            }
            .into());
        }

        for child in node.children {
            match child {
                WhereChild::Filter(filter) => self.rewrite_filter(filter, negated, output)?,
                WhereChild::Raw(fragment) => {
                    let fragment = if negated { fragment.negate() } else { fragment };
                    output.conditions.push(Condition::Raw(fragment));
                }
                WhereChild::Node(inner) => self.rewrite_node(inner, negated, output)?,
            }
        }
        Ok(())
    }

    fn rewrite_filter(
        &self,
        filter: Filter,
        outer_negated: bool,
        output: &mut RewriteOutput,
    ) -> SphinxResult<()> {
        let (name, lookup) = filter.parse_key()?;
        let field = self.meta.require_field(name)?;
        let negated = outer_negated ^ filter.negated;

        let rewritten = lookups::rewrite(field, lookup, &filter.value, negated, self.statement)?;
        trace!(
            field = %field.name,
            lookup = %lookup,
            negated,
            "rewrote filter"
        );

        match rewritten {
            Rewritten::Predicate(fragment) => output.conditions.push(Condition::Predicate(fragment)),
            Rewritten::Raw(fragment) => output.conditions.push(Condition::Raw(fragment)),
            Rewritten::MatchTerms { field, terms } => output.match_spec.add_field(&field, terms),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SphinxError;
    use crate::schema::{FieldDef, FieldKind, IndexSchema};
    use crate::types::{SqlValue, Value};

    fn schema() -> IndexSchema {
        IndexSchema::new(
            "testapp_testmodel",
            vec![
                FieldDef::id(),
                FieldDef::new("sphinx_field", FieldKind::Text),
                FieldDef::new("attr_uint", FieldKind::Integer),
                FieldDef::new("attr_multi", FieldKind::Multi),
            ],
        )
    }

    fn node(children: Vec<WhereChild>) -> WhereNode {
        WhereNode {
            children,
            ..WhereNode::default()
        }
    }

    #[test]
    fn test_filters_are_partitioned() {
        let s = schema();
        let rewriter = Rewriter::new(&s, StatementKind::Select);
        let out = rewriter
            .rewrite(node(vec![
                Filter::new("attr_uint__gt", 1).into(),
                Filter::new("attr_multi__in", vec![1i64, 2]).into(),
                Filter::new("sphinx_field", "hello").into(),
            ]))
            .unwrap();
        assert_eq!(out.conditions.len(), 2);
        assert!(matches!(out.conditions[0], Condition::Predicate(_)));
        assert!(matches!(out.conditions[1], Condition::Raw(_)));
        assert_eq!(out.match_spec.bucket("sphinx_field").unwrap(), ["hello"]);

        let w = out.where_fragment();
        assert_eq!(w.sql, "attr_uint > %s AND IN(attr_multi, %s, %s)");
        assert_eq!(
            w.params,
            vec![
                SqlValue::Integer(1),
                SqlValue::Integer(1),
                SqlValue::Integer(2)
            ]
        );
    }

    #[test]
    fn test_pk_alias() {
        let s = schema();
        let out = Rewriter::new(&s, StatementKind::Select)
            .rewrite(node(vec![Filter::new("pk", 7).into()]))
            .unwrap();
        assert_eq!(out.where_fragment().sql, "id = %s");
    }

    #[test]
    fn test_or_connector_rejected() {
        let s = schema();
        let tree = node(vec![
            WhereNode::any(vec![
                Filter::new("attr_uint", 1).into(),
                Filter::new("attr_uint", 2).into(),
            ])
            .into(),
        ]);
        let err = Rewriter::new(&s, StatementKind::Select)
            .rewrite(tree)
            .unwrap_err();
        assert!(matches!(
            err,
            SphinxError::Validation(ValidationError::OrConnector)
        ));
    }

    #[test]
    fn test_negated_group_with_many_children_rejected() {
        let s = schema();
        let tree = node(vec![
            WhereNode::not(vec![
                Filter::new("attr_uint", 1).into(),
                Filter::new("id", 2).into(),
            ])
            .into(),
        ]);
        let err = Rewriter::new(&s, StatementKind::Select)
            .rewrite(tree)
            .unwrap_err();
        assert!(matches!(
            err,
            SphinxError::Validation(ValidationError::NegatedGroup { children: 2 })
        ));
    }

    #[test]
    fn test_negated_single_child_group() {
        let s = schema();
        let tree = node(vec![
            WhereNode::not(vec![Filter::new("attr_uint", 1).into()]).into(),
        ]);
        let out = Rewriter::new(&s, StatementKind::Select)
            .rewrite(tree)
            .unwrap();
        assert_eq!(out.where_fragment().sql, "attr_uint <> %s");
    }

    #[test]
    fn test_negated_fulltext_becomes_negative_term() {
        let s = schema();
        let out = Rewriter::new(&s, StatementKind::Select)
            .rewrite(node(vec![Filter::not("sphinx_field", "spam").into()]))
            .unwrap();
        assert!(out.conditions.is_empty());
        assert_eq!(out.match_spec.bucket("sphinx_field").unwrap(), ["-spam"]);
    }

    #[test]
    fn test_unknown_field() {
        let s = schema();
        let err = Rewriter::new(&s, StatementKind::Select)
            .rewrite(node(vec![Filter::new("nope", Value::Null).into()]))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
