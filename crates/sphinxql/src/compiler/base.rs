//! Base relational compilation.
//!
//! Resolves fields to columns and renders the clause set every statement
//! shares: select list, ordering, grouping columns, INSERT rows and written
//! values. The engine-specific shape of the statement is left to the
//! [assembler](super::assembler).

use crate::error::{SphinxResult, ValidationError};
use crate::schema::{FieldDef, ModelMeta};
use crate::types::{Aggregate, Assignments, OrderBy, Query, SelectItem, SqlValue, Value};

use super::escape::is_identifier;
use super::fragment::{CompiledStatement, PLACEHOLDER, SqlFragment};

/// One entry of a rendered select list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    /// Expression SQL.
    pub sql: String,
    /// Parameters of the expression.
    pub params: Vec<SqlValue>,
    /// Optional alias.
    pub alias: Option<String>,
}

impl SelectExpr {
    /// A bare column.
    pub fn column(column: &str) -> Self {
        Self {
            sql: column.to_string(),
            params: Vec::new(),
            alias: None,
        }
    }

    /// An aliased expression.
    pub fn aliased(fragment: SqlFragment, alias: &str) -> Self {
        Self {
            sql: fragment.sql,
            params: fragment.params,
            alias: Some(alias.to_string()),
        }
    }

    fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.sql, alias),
            None => self.sql.clone(),
        }
    }
}

/// Structured SELECT clauses, before engine-specific assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectParts {
    /// Select list.
    pub columns: Vec<SelectExpr>,
    /// Index name.
    pub table: String,
    /// Literal WHERE conjuncts.
    pub conditions: Vec<SqlFragment>,
    /// Grouping columns.
    pub group_by: Vec<String>,
    /// ORDER BY terms.
    pub order_by: Vec<String>,
}

impl SelectParts {
    /// Renders `SELECT ... FROM ... [WHERE ...]` and collects its params.
    pub fn render_head(&self) -> SqlFragment {
        let mut params = Vec::new();
        let columns = self
            .columns
            .iter()
            .map(|c| {
                params.extend(c.params.iter().cloned());
                c.render()
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {} FROM {}", columns, self.table);
        let conditions = self
            .conditions
            .iter()
            .cloned()
            .fold(SqlFragment::default(), SqlFragment::and);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.sql);
            params.extend(conditions.params);
        }
        SqlFragment::with_params(sql, params)
    }
}

/// Renders the generic clause set of a query.
pub struct BaseCompiler<'a> {
    meta: &'a dyn ModelMeta,
}

impl<'a> BaseCompiler<'a> {
    /// Creates a base compiler for one index.
    pub fn new(meta: &'a dyn ModelMeta) -> Self {
        Self { meta }
    }

    /// Resolves the target index name.
    pub fn table(&self, query: &Query) -> Result<String, ValidationError> {
        let table = query.table.as_deref().unwrap_or_else(|| self.meta.table());
        checked_identifier(table)
    }

    /// Builds the SELECT clauses, without WHERE conditions.
    pub fn select_parts(&self, query: &Query) -> SphinxResult<SelectParts> {
        let mut parts = SelectParts {
            table: self.table(query)?,
            columns: self.select_list(&query.selection)?,
            ..SelectParts::default()
        };

        for term in &query.order_by {
            parts.order_by.push(self.order_term(term)?);
        }

        if let Some(group) = &query.group {
            for column in &group.columns {
                parts.group_by.push(self.column_or_alias(column)?);
            }
        }
        Ok(parts)
    }

    fn select_list(&self, selection: &[SelectItem]) -> Result<Vec<SelectExpr>, ValidationError> {
        if selection.is_empty() {
            return Ok(self
                .meta
                .fields()
                .iter()
                .filter(|f| f.rendering().is_selectable())
                .map(|f| SelectExpr::column(f.column()))
                .collect());
        }

        selection
            .iter()
            .map(|item| match item {
                SelectItem::Field(name) => {
                    let field = self.meta.require_field(name)?;
                    if !field.rendering().is_selectable() {
                        return Err(ValidationError::NotSelectable {
                            field: field.name.clone(),
                        });
                    }
                    Ok(SelectExpr::column(field.column()))
                }
                SelectItem::Aggregate { func, field, alias } => {
                    let alias = checked_identifier(alias)?;
                    let fragment = match field {
                        None if *func != Aggregate::Count => {
                            return Err(ValidationError::StarAggregate {
                                func: func.as_str().to_string(),
                                alias,
                            });
                        }
                        // rendered as a bound '*', fixed up by the assembler
                        None => SqlFragment::with_params(
                            format!("{}({})", func.as_str(), PLACEHOLDER),
                            vec![SqlValue::string("*")],
                        ),
                        Some(name) => {
                            let column = self.meta.require_field(name)?.column();
                            SqlFragment::new(format!("{}({})", func.as_str(), column))
                        }
                    };
                    Ok(SelectExpr::aliased(fragment, &alias))
                }
                SelectItem::Expr { sql, alias } => {
                    let alias = checked_identifier(alias)?;
                    Ok(SelectExpr::aliased(SqlFragment::new(sql.clone()), &alias))
                }
            })
            .collect()
    }

    fn order_term(&self, term: &OrderBy) -> Result<String, ValidationError> {
        Ok(match term {
            OrderBy::Field { name, direction } => {
                format!("{} {}", self.column_or_alias(name)?, direction)
            }
            OrderBy::Random => "RAND()".to_string(),
            OrderBy::Expr { sql, direction } => format!("{} {}", sql, direction),
        })
    }

    /// Resolves a field to its column, or accepts a select alias.
    pub fn column_or_alias(&self, name: &str) -> Result<String, ValidationError> {
        match self.meta.resolve_column(name) {
            Some(column) => Ok(column.to_string()),
            None => checked_identifier(name),
        }
    }

    /// Renders a multi-row INSERT.
    pub fn insert(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        let Some(first) = query.rows.first() else {
            return Ok(CompiledStatement::empty());
        };
        let names: Vec<&str> = first.iter().map(|(name, _)| name.as_str()).collect();
        let fields = names
            .iter()
            .map(|name| self.meta.require_field(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut params = Vec::new();
        let mut tuples = Vec::with_capacity(query.rows.len());
        for (index, row) in query.rows.iter().enumerate() {
            let same_columns = row.len() == names.len()
                && row.iter().zip(&names).all(|((name, _), expected)| name.as_str() == *expected);
            if !same_columns {
                return Err(ValidationError::InconsistentInsertRow { index }.into());
            }
            let mut values = Vec::with_capacity(row.len());
            for (field, (_, value)) in fields.iter().zip(row) {
                values.push(write_value(field, value, &mut params)?);
            }
            tuples.push(format!("({})", values.join(", ")));
        }

        let columns = fields
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(CompiledStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES {}",
                self.table(query)?,
                columns,
                tuples.join(", ")
            ),
            params,
        })
    }

    /// Renders `col=%s, ...` for written values.
    pub fn assignments(&self, values: &Assignments) -> SphinxResult<SqlFragment> {
        let mut params = Vec::new();
        let mut parts = Vec::with_capacity(values.len());
        for (name, value) in values {
            let field = self.meta.require_field(name)?;
            let sql = write_value(field, value, &mut params)?;
            parts.push(format!("{}={}", field.column(), sql));
        }
        Ok(SqlFragment::with_params(parts.join(", "), params))
    }
}

/// Renders one written value.
///
/// The field's [`ColumnRendering`](crate::schema::ColumnRendering) decides
/// what is inlined: `NULL`, and `(1,2,3)` for multi-value attributes. Any
/// other value becomes a placeholder and its param is appended.
pub fn write_value(
    field: &FieldDef,
    value: &Value,
    params: &mut Vec<SqlValue>,
) -> SphinxResult<String> {
    let prepared = field.prepare(value)?;
    if let Some(literal) = field.rendering().inline_literal(&prepared) {
        return Ok(literal);
    }
    params.push(prepared);
    Ok(PLACEHOLDER.to_string())
}

fn checked_identifier(name: &str) -> Result<String, ValidationError> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(ValidationError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
