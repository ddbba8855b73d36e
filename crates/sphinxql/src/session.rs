//! Executing compiled statements.
//!
//! A [`Session`] pairs a schema, a compiler config and an [`Executor`]. The
//! executor owns the connection to the search daemon; this crate never opens
//! one itself.

use std::sync::Arc;

use tracing::debug;

use crate::compiler::{CompiledStatement, Compiler};
use crate::config::CompilerConfig;
use crate::error::{ExecutorError, SphinxResult, ValidationError};
use crate::schema::{IndexSchema, ModelMeta};
use crate::types::{Aggregate, Assignments, Query, Row, SelectItem, SqlValue, StatementKind, Value};

/// Runs SQL against the search daemon.
pub trait Executor {
    /// Executes one statement and returns its result rows.
    ///
    /// Statements that return no result set return an empty vector.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, ExecutorError>;

    /// Rows changed by the last statement, as the daemon reports them.
    ///
    /// Drivers that expose an affected-rows count return it here. The
    /// default `None` makes [`Session::execute`] fall back to the number of
    /// returned rows.
    fn affected_rows(&self) -> Option<usize> {
        None
    }
}

/// Compiles and runs queries against one index.
pub struct Session<E: Executor> {
    schema: Arc<IndexSchema>,
    config: CompilerConfig,
    executor: E,
}

impl<E: Executor> Session<E> {
    /// Creates a session.
    pub fn new(schema: Arc<IndexSchema>, config: CompilerConfig, executor: E) -> Self {
        Self {
            schema,
            config,
            executor,
        }
    }

    /// The index schema.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The executor, mutably.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Consumes the session and returns the executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Compiles a query without running it.
    pub fn compile(&self, query: &Query) -> SphinxResult<CompiledStatement> {
        Compiler::new(self.schema.as_ref(), &self.config).compile(query)
    }

    fn run(&mut self, statement: &CompiledStatement) -> SphinxResult<Vec<Row>> {
        debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "executing statement"
        );
        Ok(self.executor.execute(&statement.sql, &statement.params)?)
    }

    /// Runs a SELECT and returns its rows.
    pub fn fetch(&mut self, query: &Query) -> SphinxResult<Vec<Row>> {
        let statement = self.compile(query)?;
        if statement.is_empty() {
            return Ok(Vec::new());
        }
        self.run(&statement)
    }

    /// Runs a write and returns the number of affected rows.
    ///
    /// The count comes from [`Executor::affected_rows`]. Executors without
    /// one report the length of the result set instead, which is 0 for a
    /// write that returns none. Queries that compile to the empty statement
    /// return 0 without reaching the executor.
    pub fn execute(&mut self, query: &Query) -> SphinxResult<usize> {
        let statement = self.compile(query)?;
        if statement.is_empty() {
            debug!("empty statement, nothing to execute");
            return Ok(0);
        }
        let rows = self.run(&statement)?;
        Ok(self.executor.affected_rows().unwrap_or(rows.len()))
    }

    /// Counts the rows matched by a query.
    pub fn count(&mut self, query: &Query) -> SphinxResult<u64> {
        let alias = self.config.count_alias.clone();
        let mut counting = query.clone();
        counting.kind = StatementKind::Select;
        counting.selection = vec![SelectItem::Aggregate {
            func: Aggregate::Count,
            field: None,
            alias: alias.clone(),
        }];
        counting.order_by.clear();
        counting.limit = None;
        counting.offset = None;

        let rows = self.fetch(&counting)?;
        let count = rows
            .first()
            .and_then(|row| row.get(&alias))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Saves a document.
    ///
    /// New documents are inserted with every given column. Existing ones are
    /// updated by primary key. Without `update_fields` only fixed-width
    /// fields are written; naming a string field in `update_fields` turns
    /// the update into a REPLACE of the whole document.
    pub fn save(
        &mut self,
        document: &Assignments,
        is_new: bool,
        update_fields: Option<&[&str]>,
    ) -> SphinxResult<usize> {
        if is_new {
            return self.execute(&Query::insert().row(document.iter().cloned()));
        }

        let schema = Arc::clone(&self.schema);
        let missing_pk = || ValidationError::MissingPrimaryKey {
            table: schema.table().to_string(),
        };
        let pk_field = schema.primary_key_field().ok_or_else(missing_pk)?;
        let pk = document
            .iter()
            .find(|(name, _)| *name == pk_field.name)
            .map(|(_, value)| value.clone())
            .ok_or_else(missing_pk)?;

        let writable = |name: &str| match update_fields {
            Some(fields) => fields.contains(&name),
            None => schema
                .field(name)
                .is_some_and(|f| !f.kind.is_variable_length()),
        };

        let mut query = Query::update()
            .filter(pk_field.name.clone(), pk)
            .with_current_row(document.clone());
        for (name, value) in document {
            if *name != pk_field.name && writable(name) {
                query = query.set(name.clone(), value.clone());
            }
        }
        self.execute(&query)
    }

    /// Decodes a result row into typed values.
    pub fn decode(&self, row: &Row) -> SphinxResult<Vec<(String, Value)>> {
        self.schema.decode_row(row)
    }
}
