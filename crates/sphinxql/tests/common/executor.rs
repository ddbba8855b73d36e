//! An executor that records statements instead of running them.

use std::collections::VecDeque;

use sphinxql::{Executor, ExecutorError, Row, SqlValue};

/// A statement seen by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Records every statement and replays queued results.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub statements: Vec<Recorded>,
    results: VecDeque<Result<Vec<Row>, String>>,
    affected: Option<usize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues rows returned by the next statement.
    pub fn push_rows(&mut self, rows: Vec<Row>) {
        self.results.push_back(Ok(rows));
    }

    /// Queues a failure for the next statement.
    pub fn push_error(&mut self, message: &str) {
        self.results.push_back(Err(message.to_string()));
    }

    /// Reports an affected-rows count for every following statement.
    pub fn set_affected_rows(&mut self, count: usize) {
        self.affected = Some(count);
    }

    pub fn last(&self) -> Option<&Recorded> {
        self.statements.last()
    }
}

impl Executor for RecordingExecutor {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, ExecutorError> {
        self.statements.push(Recorded {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match self.results.pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(ExecutorError::failed(message)),
            None => Ok(Vec::new()),
        }
    }

    fn affected_rows(&self) -> Option<usize> {
        self.affected
    }
}
