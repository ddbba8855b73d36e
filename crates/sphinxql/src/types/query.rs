//! The query model.
//!
//! A [`Query`] is a plain value built with chained calls. Compiling borrows
//! it, so one query can be compiled any number of times.

use crate::compiler::fragment::SqlFragment;
use crate::types::{
    Direction, Filter, GroupSpec, MatchSpec, OptionValue, OrderBy, QueryOptions, SqlValue, Value,
    WhereChild, WhereNode,
};

/// Statement kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT
    #[default]
    Select,
    /// INSERT
    Insert,
    /// UPDATE, possibly compiled as REPLACE.
    Update,
    /// DELETE
    Delete,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// COUNT
    Count,
    /// SUM
    Sum,
    /// AVG
    Avg,
    /// MIN
    Min,
    /// MAX
    Max,
}

impl Aggregate {
    /// SQL function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// An entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A schema field.
    Field(String),
    /// An aggregate over a field, or over `*` when `field` is `None`.
    Aggregate {
        /// Function.
        func: Aggregate,
        /// Argument field.
        field: Option<String>,
        /// Result alias.
        alias: String,
    },
    /// A raw expression such as `WEIGHT()`.
    Expr {
        /// SQL expression.
        sql: String,
        /// Result alias.
        alias: String,
    },
}

/// `(field, value)` pairs of a write.
pub type Assignments = Vec<(String, Value)>;

/// A query against one index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Statement kind.
    pub kind: StatementKind,
    /// Target index. Defaults to the schema's table.
    pub table: Option<String>,
    /// Predicate tree.
    pub filters: WhereNode,
    /// Full-text match.
    pub match_spec: MatchSpec,
    /// Grouping.
    pub group: Option<GroupSpec>,
    /// OPTION clause.
    pub options: QueryOptions,
    /// ORDER BY terms.
    pub order_by: Vec<OrderBy>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
    /// Select list. Empty selects every selectable field.
    pub selection: Vec<SelectItem>,
    /// Values written by UPDATE.
    pub values: Assignments,
    /// Rows written by INSERT.
    pub rows: Vec<Assignments>,
    /// The document as currently stored, used to complete a REPLACE.
    pub current_row: Option<Assignments>,
}

impl Query {
    /// Creates an empty query of the given kind.
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Creates a SELECT.
    pub fn select() -> Self {
        Self::new(StatementKind::Select)
    }

    /// Creates an INSERT.
    pub fn insert() -> Self {
        Self::new(StatementKind::Insert)
    }

    /// Creates an UPDATE.
    pub fn update() -> Self {
        Self::new(StatementKind::Update)
    }

    /// Creates a DELETE.
    pub fn delete() -> Self {
        Self::new(StatementKind::Delete)
    }

    /// Targets another index with the same schema.
    pub fn from_index(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a keyword filter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(key, value).into());
        self
    }

    /// Adds an excluding keyword filter.
    pub fn exclude(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::not(key, value).into());
        self
    }

    /// Adds `field <> value`.
    ///
    /// For full-text fields this becomes a negated match term.
    pub fn not_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exclude(field, value)
    }

    /// Adds a nested predicate group.
    pub fn where_node(mut self, node: WhereNode) -> Self {
        self.filters.push(node.into());
        self
    }

    /// Adds a raw condition with `%s` placeholders.
    pub fn extra_where(mut self, sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        self.filters
            .push(WhereChild::Raw(SqlFragment::with_params(sql, params)));
        self
    }

    /// Matches a raw expression against all fields.
    pub fn match_all(mut self, expression: impl Into<String>) -> Self {
        self.match_spec.add_all(expression);
        self
    }

    /// Matches terms against one field. A leading `-` negates a term.
    pub fn match_field<I, S>(mut self, field: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_spec.add_field(field, terms);
        self
    }

    /// Groups by fields.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = self.group.get_or_insert_with(GroupSpec::default);
        group.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Keeps up to `n` rows per group.
    pub fn group_limit(mut self, n: u32) -> Self {
        self.group.get_or_insert_with(GroupSpec::default).limit = Some(n);
        self
    }

    /// Orders rows inside each group. `-field` sorts descending.
    pub fn within_group_order_by(mut self, spec: &str) -> Self {
        let (column, direction) = match spec.strip_prefix('-') {
            Some(column) => (column, Direction::Desc),
            None => (spec, Direction::Asc),
        };
        self.group
            .get_or_insert_with(GroupSpec::default)
            .order_by
            .push((column.to_string(), direction));
        self
    }

    /// Sets an OPTION.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Adds an ORDER BY term: `field`, `-field` or `?`.
    pub fn order_by(mut self, spec: &str) -> Self {
        self.order_by.push(OrderBy::parse(spec));
        self
    }

    /// Adds a raw ORDER BY expression.
    pub fn order_by_expr(mut self, sql: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy::expr(sql, direction));
        self
    }

    /// Sets the row limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Selects only the given fields.
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection
            .extend(fields.into_iter().map(|f| SelectItem::Field(f.into())));
        self
    }

    /// Adds an aggregate. `None` aggregates over `*`.
    pub fn aggregate(mut self, func: Aggregate, field: Option<&str>, alias: &str) -> Self {
        self.selection.push(SelectItem::Aggregate {
            func,
            field: field.map(str::to_string),
            alias: alias.to_string(),
        });
        self
    }

    /// Adds a raw select expression.
    pub fn extra_select(mut self, alias: &str, sql: impl Into<String>) -> Self {
        self.selection.push(SelectItem::Expr {
            sql: sql.into(),
            alias: alias.to_string(),
        });
        self
    }

    /// Sets a value written by UPDATE.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((field.into(), value.into()));
        self
    }

    /// Adds a row written by INSERT.
    pub fn row<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        self.rows.push(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Supplies the stored document for completing a REPLACE.
    pub fn with_current_row(mut self, row: Assignments) -> Self {
        self.current_row = Some(row);
        self
    }
}
