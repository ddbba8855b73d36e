//! Error types for the SphinxQL compiler.
//!
//! Errors are split by the stage that raises them: validation errors come
//! from the predicate rewriter and the statement assembler before any SQL is
//! produced, type errors come from converting write values into their
//! database representation, and executor errors are surfaced unchanged from
//! the transport layer.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::schema::FieldKind;

/// The primary error type for all compiler and session operations.
#[derive(Error, Debug)]
pub enum SphinxError {
    /// Query shape errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Value conversion errors
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Errors reported by the executor
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Errors raised while validating a query before compilation completes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The lookup cannot be expressed for this kind of field.
    #[error("unsupported lookup '{lookup}' on {kind} field '{field}'")]
    UnsupportedLookup {
        field: String,
        lookup: String,
        kind: FieldKind,
    },

    /// The lookup is supported, but not in a negated filter.
    #[error("negated '{lookup}' lookup not supported on field '{field}'")]
    NegatedLookup { field: String, lookup: String },

    /// The field does not exist on the index.
    #[error("unknown field '{field}' on index '{table}'")]
    UnknownField { table: String, field: String },

    /// The filter key names a lookup this compiler does not know.
    #[error("unknown lookup '{lookup}' in filter '{key}'")]
    UnknownLookup { key: String, lookup: String },

    /// The filter key has more than one lookup segment.
    #[error("can't build a lookup for '{key}'")]
    MalformedFilterKey { key: String },

    /// SphinxQL has no OR in WHERE.
    #[error("OR connector is not supported in WHERE")]
    OrConnector,

    /// Only single-condition groups may be negated.
    #[error("negated group with {children} conditions is not supported")]
    NegatedGroup { children: usize },

    /// A membership lookup was given no values.
    #[error("empty '{lookup}' lookup on field '{field}'")]
    EmptyMembership { field: String, lookup: String },

    /// A `range` lookup was not given exactly two bounds.
    #[error("range lookup on field '{field}' expects two bounds, got {count}")]
    InvalidRange { field: String, count: usize },

    /// Full-text fields cannot be returned by the engine.
    #[error("field '{field}' is full-text indexed and cannot be selected")]
    NotSelectable { field: String },

    /// Option names are inlined into SQL and must be plain identifiers.
    #[error("invalid OPTION name '{name}'")]
    InvalidOptionName { name: String },

    /// The statement has no OPTION clause.
    #[error("OPTION is not supported on {statement} statements")]
    OptionsNotAllowed { statement: String },

    /// Only COUNT can aggregate over `*`.
    #[error("{func}(*) AS {alias} is not supported, only COUNT accepts '*'")]
    StarAggregate { func: String, alias: String },

    /// Aliases and expression names are inlined into SQL.
    #[error("invalid identifier '{name}'")]
    InvalidIdentifier { name: String },

    /// REPLACE rewrites the whole document and needs every column.
    #[error("REPLACE INTO {table} is missing values for: {}", .missing.join(", "))]
    IncompleteRow { table: String, missing: Vec<String> },

    /// Multi-row INSERT rows must share one column list.
    #[error("insert row {index} has columns that differ from the first row")]
    InconsistentInsertRow { index: usize },

    /// A multi-value attribute cell failed to parse.
    #[error("invalid multi-value '{value}' for field '{field}'")]
    InvalidMultiValue { field: String, value: String },

    /// The schema has no primary key.
    #[error("index '{table}' has no primary key field")]
    MissingPrimaryKey { table: String },
}

/// Errors raised when a value has no database-preparable form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    /// The value type does not fit the field kind.
    #[error("field '{field}' of kind {expected} cannot store a {found} value")]
    NotPreparable {
        field: String,
        expected: FieldKind,
        found: &'static str,
    },

    /// The timestamp is out of the representable range.
    #[error("invalid timestamp for field '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },
}

/// Errors reported by an [`Executor`](crate::session::Executor).
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The search daemon rejected the statement or the connection failed.
    #[error("statement failed: {message}")]
    Failed { message: String },

    /// A lower-level error from the transport.
    #[error("transport error: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ExecutorError {
    /// Creates a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        ExecutorError::Failed {
            message: message.into(),
        }
    }
}

/// Result type for compiler and session operations.
pub type SphinxResult<T> = Result<T, SphinxError>;
