//! Core types for queries, values and results.

mod filter;
mod group;
mod match_spec;
pub mod mva;
mod options;
mod query;
mod value;

pub use filter::{Connector, Filter, LOOKUP_SEP, Lookup, WhereChild, WhereNode};
pub use group::{Direction, GroupSpec, OrderBy};
pub use match_spec::{MatchBucket, MatchSpec};
pub use options::{OptionValue, QueryOptions};
pub use query::{Aggregate, Assignments, Query, SelectItem, StatementKind};
pub use value::{Row, SqlValue, Value};
