//! Statement assembly.
//!
//! Takes the base clauses and gives them the shape the engine accepts:
//!
//! - WHERE conditions move into a `(...) AS __where_result` projection,
//!   because the engine evaluates expressions in the select list far better
//!   than in WHERE. The literal WHERE keeps only MATCH() and
//!   `__where_result = %s`.
//! - `LIMIT O, L` replaces `LIMIT L OFFSET O`.
//! - `GROUP N BY ... WITHIN GROUP ORDER BY ...` replaces plain GROUP BY.
//! - A trailing OPTION clause is appended.
//! - `COUNT('*')` becomes `COUNT(*)`.

use tracing::warn;

use crate::config::CompilerConfig;
use crate::error::{SphinxResult, ValidationError};
use crate::schema::ModelMeta;
use crate::types::{GroupSpec, Query, QueryOptions, SqlValue, StatementKind};

use super::base::{BaseCompiler, SelectExpr, SelectParts};
use super::escape::is_identifier;
use super::fragment::{CompiledStatement, PLACEHOLDER, SqlFragment, escape_percent};
use super::match_expr::render_clause;
use super::rewriter::{RewriteOutput, Rewriter};
use super::update::{UpdateStrategy, compile_replace, select_strategy};

/// Compiles queries against one index.
///
/// Borrows the schema and config and holds no other state, so a compiler
/// can be shared freely across threads.
pub struct Compiler<'a> {
    meta: &'a dyn ModelMeta,
    config: &'a CompilerConfig,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler.
    pub fn new(meta: &'a dyn ModelMeta, config: &'a CompilerConfig) -> Self {
        Self { meta, config }
    }

    /// Compiles a query into SQL and parameters.
    pub fn compile(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        let statement = match query.kind {
            StatementKind::Select => self.compile_select(query)?,
            StatementKind::Insert => BaseCompiler::new(self.meta).insert(query)?,
            StatementKind::Update => self.compile_update(query)?,
            StatementKind::Delete => self.compile_delete(query)?,
        };
        Ok(statement.render(self.config.param_style))
    }

    /// Rewrites filters and renders the merged MATCH clause.
    fn rewrite(
        &self,
        query: &Query,
        kind: StatementKind,
    ) -> SphinxResult<(RewriteOutput, Option<String>)> {
        let output = Rewriter::new(self.meta, kind).rewrite(query.filters.clone())?;
        let mut match_spec = query.match_spec.clone();
        match_spec.merge(output.match_spec.clone());
        let clause = render_clause(&match_spec, self.meta)?;
        Ok((output, clause))
    }

    fn compile_select(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        let (output, match_clause) = self.rewrite(query, StatementKind::Select)?;
        let mut parts = BaseCompiler::new(self.meta).select_parts(query)?;

        if let Some(clause) = match_clause {
            parts.conditions.push(SqlFragment::new(clause));
        }

        let where_fragment = output.where_fragment();
        if !where_fragment.is_empty() {
            let alias = &self.config.where_result_alias;
            parts.columns.push(SelectExpr::aliased(
                SqlFragment::with_params(
                    format!("({})", where_fragment.sql),
                    where_fragment.params,
                ),
                alias,
            ));
            parts.conditions.push(SqlFragment::with_params(
                format!("{} = {}", alias, PLACEHOLDER),
                vec![SqlValue::Bool(true)],
            ));
        }

        fix_count_star(&mut parts.columns);

        let mut statement = parts.render_head();
        self.push_group(&mut statement, &parts, query.group.as_ref())?;
        if !parts.order_by.is_empty() {
            statement.sql.push_str(" ORDER BY ");
            statement.sql.push_str(&parts.order_by.join(", "));
        }
        self.push_limit(&mut statement, query.limit, query.offset);
        self.push_options(&mut statement, &query.options)?;
        Ok(statement.into())
    }

    fn compile_update(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        if query.values.is_empty() {
            return Ok(CompiledStatement::empty());
        }
        if let UpdateStrategy::Replace { pk } = select_strategy(self.meta, query) {
            return compile_replace(self.meta, query, &pk);
        }

        let base = BaseCompiler::new(self.meta);
        let assignments = base.assignments(&query.values)?;
        let (output, match_clause) = self.rewrite(query, StatementKind::Update)?;

        let mut statement = SqlFragment::with_params(
            format!("UPDATE {} SET {}", base.table(query)?, assignments.sql),
            assignments.params,
        );
        push_where(&mut statement, match_clause, output);
        self.push_options(&mut statement, &query.options)?;
        Ok(statement.into())
    }

    fn compile_delete(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        let base = BaseCompiler::new(self.meta);
        let (output, match_clause) = self.rewrite(query, StatementKind::Delete)?;
        let mut statement = SqlFragment::new(format!("DELETE FROM {}", base.table(query)?));
        push_where(&mut statement, match_clause, output);
        Ok(statement.into())
    }

    fn push_group(
        &self,
        statement: &mut SqlFragment,
        parts: &SelectParts,
        group: Option<&GroupSpec>,
    ) -> Result<(), ValidationError> {
        let Some(group) = group else {
            return Ok(());
        };
        if parts.group_by.is_empty() {
            return Ok(());
        }

        match group.cap() {
            Some(n) => statement.sql.push_str(&format!(" GROUP {} BY ", n)),
            None => statement.sql.push_str(" GROUP BY "),
        }
        statement.sql.push_str(&parts.group_by.join(", "));

        if !group.order_by.is_empty() {
            let base = BaseCompiler::new(self.meta);
            let terms = group
                .order_by
                .iter()
                .map(|(column, direction)| {
                    Ok(format!("{} {}", base.column_or_alias(column)?, direction))
                })
                .collect::<Result<Vec<_>, ValidationError>>()?;
            statement.sql.push_str(" WITHIN GROUP ORDER BY ");
            statement.sql.push_str(&terms.join(", "));
        }
        Ok(())
    }

    fn push_limit(&self, statement: &mut SqlFragment, limit: Option<u64>, offset: Option<u64>) {
        let offset = offset.filter(|o| *o > 0);
        let clause = match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {}, {}", offset, limit),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (None, Some(offset)) => {
                warn!(
                    offset,
                    max_matches = self.config.max_matches,
                    "offset without limit, using max_matches as limit"
                );
                format!(" LIMIT {}, {}", offset, self.config.max_matches)
            }
            (None, None) => return,
        };
        statement.sql.push_str(&clause);
    }

    fn push_options(
        &self,
        statement: &mut SqlFragment,
        options: &QueryOptions,
    ) -> Result<(), ValidationError> {
        if options.is_empty() {
            return Ok(());
        }
        let mut rendered = Vec::with_capacity(options.len());
        for (name, value) in options {
            if !is_identifier(name) {
                return Err(ValidationError::InvalidOptionName { name: name.clone() });
            }
            if self.config.is_safe_option(name) {
                rendered.push(format!("{}={}", name, escape_percent(&value.to_string())));
            } else {
                rendered.push(format!("{}={}", name, PLACEHOLDER));
                statement.params.push(value.to_param());
            }
        }
        statement.sql.push_str(" OPTION ");
        statement.sql.push_str(&rendered.join(", "));
        Ok(())
    }
}

/// Appends `WHERE match AND conditions` for UPDATE and DELETE.
fn push_where(statement: &mut SqlFragment, match_clause: Option<String>, output: RewriteOutput) {
    let conditions = match_clause
        .map(SqlFragment::new)
        .unwrap_or_default()
        .and(output.where_fragment());
    if conditions.is_empty() {
        return;
    }
    statement.sql.push_str(" WHERE ");
    statement.sql.push_str(&conditions.sql);
    statement.params.extend(conditions.params);
}

/// Rewrites a bound `COUNT('*')` to `COUNT(*)` and drops its parameter.
fn fix_count_star(columns: &mut [SelectExpr]) {
    for column in columns {
        let is_count_star = column.sql == format!("COUNT({})", PLACEHOLDER)
            && column.params == [SqlValue::string("*")];
        if is_count_star {
            column.sql = "COUNT(*)".to_string();
            column.params.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind, IndexSchema};
    use crate::types::{Aggregate, OptionValue};

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

    fn compile(query: &Query) -> CompiledStatement {
        let s = schema();
        let config = CompilerConfig::default();
        Compiler::new(&s, &config).compile(query).unwrap()
    }

    #[test]
    fn test_plain_select() {
        let stmt = compile(&Query::select());
        assert_eq!(
            stmt.sql,
            "SELECT id, attr_uint, attr_multi FROM testapp_testmodel"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_where_moves_to_projection() {
        let stmt = compile(&Query::select().filter("attr_uint__gt", 1));
        assert_eq!(
            stmt.sql,
            "SELECT id, attr_uint, attr_multi, (attr_uint > %s) AS __where_result \
             FROM testapp_testmodel WHERE __where_result = %s"
        );
        assert_eq!(stmt.params, vec![SqlValue::Integer(1), SqlValue::Bool(true)]);
    }

    #[test]
    fn test_match_stays_in_where() {
        let stmt = compile(
            &Query::select()
                .filter("sphinx_field", "hello")
                .filter("attr_uint", 2),
        );
        assert!(stmt.sql.ends_with(
            "FROM testapp_testmodel WHERE MATCH('@sphinx_field (\"hello\")') AND __where_result = %s"
        ));
    }

    #[test]
    fn test_limit_offset() {
        let stmt = compile(&Query::select().limit(10).offset(20));
        assert!(stmt.sql.ends_with(" LIMIT 20, 10"));
        assert!(!stmt.sql.contains("OFFSET"));

        let stmt = compile(&Query::select().limit(10));
        assert!(stmt.sql.ends_with(" LIMIT 10"));

        let stmt = compile(&Query::select().offset(5));
        assert!(stmt.sql.ends_with(" LIMIT 5, 1000"));
    }

    #[test]
    fn test_group_n_by() {
        let stmt = compile(
            &Query::select()
                .group_by(["attr_uint"])
                .group_limit(2)
                .within_group_order_by("-id"),
        );
        assert!(stmt.sql.ends_with(
            " GROUP 2 BY attr_uint WITHIN GROUP ORDER BY id DESC"
        ));

        let stmt = compile(&Query::select().group_by(["attr_uint"]));
        assert!(stmt.sql.ends_with(" GROUP BY attr_uint"));
    }

    #[test]
    fn test_options() {
        let stmt = compile(
            &Query::select()
                .option("ranker", "bm25")
                .option("max_matches", 1)
                .option("field_weights", OptionValue::weights([("a", 3), ("b", 2)])),
        );
        assert!(stmt.sql.ends_with(
            " OPTION field_weights=(a=3,b=2), max_matches=%s, ranker=bm25"
        ));
        assert_eq!(stmt.params, vec![SqlValue::Integer(1)]);
    }

    #[test]
    fn test_invalid_option_name() {
        let s = schema();
        let config = CompilerConfig::default();
        let err = Compiler::new(&s, &config)
            .compile(&Query::select().option("bad name", 1))
            .unwrap_err();
        assert!(err.to_string().contains("bad name"));
    }

    #[test]
    fn test_count_star() {
        let stmt = compile(&Query::select().aggregate(Aggregate::Count, None, "__count"));
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) AS __count FROM testapp_testmodel"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_order_by_rand_has_no_direction() {
        let stmt = compile(&Query::select().order_by("?"));
        assert!(stmt.sql.ends_with(" ORDER BY RAND()"));
    }

    #[test]
    fn test_update() {
        let stmt = compile(
            &Query::update()
                .filter("attr_uint", 3)
                .set("attr_multi", vec![1i64, 2]),
        );
        assert_eq!(
            stmt.sql,
            "UPDATE testapp_testmodel SET attr_multi=(1,2) WHERE attr_uint = %s"
        );
        assert_eq!(stmt.params, vec![SqlValue::Integer(3)]);
    }

    #[test]
    fn test_empty_update_is_empty_statement() {
        let stmt = compile(&Query::update().filter("id", 1));
        assert!(stmt.is_empty());
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_delete_with_multi_membership() {
        let stmt = compile(&Query::delete().filter("attr_multi__in", vec![1i64, 2]));
        assert_eq!(
            stmt.sql,
            "DELETE FROM testapp_testmodel WHERE attr_multi IN (%s, %s)"
        );
    }
}
