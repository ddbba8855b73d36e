//! SphinxQL query compiler
//!
//! This crate compiles an ORM-style query model into SphinxQL, the SQL
//! dialect spoken by Sphinx and Manticore search daemons. It covers the
//! places where SphinxQL departs from standard SQL:
//!
//! - **Full-text search**: filters on full-text fields and explicit match
//!   terms are merged into a single escaped `MATCH('...')` clause
//! - **Multi-value attributes**: membership and range filters render the
//!   engine's `IN()`, `LEAST()` and `GREATEST()` functions
//! - **No OFFSET**: pagination renders `LIMIT offset, count`
//! - **Grouping**: `GROUP N BY ... WITHIN GROUP ORDER BY ...`
//! - **OPTION clause**: ranker, weights and other per-query options
//! - **Restricted UPDATE**: single-row updates of string attributes become
//!   a full-row `REPLACE INTO`
//!
//! # Architecture
//!
//! - [`schema`] - Index fields and the [`ModelMeta`] trait the compiler reads
//! - [`types`] - The query model, values and result rows
//! - [`compiler`] - Predicate rewriting, MATCH serialization and assembly
//! - [`session`] - Running compiled statements through an [`Executor`]
//! - [`config`] - Compiler settings
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use sphinxql::{Compiler, CompilerConfig, FieldDef, FieldKind, IndexSchema, Query};
//!
//! let schema = IndexSchema::new(
//!     "products",
//!     vec![
//!         FieldDef::id(),
//!         FieldDef::new("title", FieldKind::Text),
//!         FieldDef::new("price", FieldKind::Integer),
//!         FieldDef::new("tags", FieldKind::Multi),
//!     ],
//! );
//! let config = CompilerConfig::default();
//!
//! let query = Query::select()
//!     .filter("title", "red shoes")
//!     .filter("price__lt", 100)
//!     .filter("tags__in", vec![1i64, 2])
//!     .limit(20)
//!     .offset(40);
//!
//! let compiled = Compiler::new(&schema, &config).compile(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT id, price, tags, (price < %s AND IN(tags, %s, %s)) AS __where_result \
//!      FROM products WHERE MATCH('@title (\"red shoes\")') AND __where_result = %s \
//!      LIMIT 40, 20"
//! );
//! assert_eq!(compiled.params.len(), 4);
//! ```
//!
//! # Updates
//!
//! ```
//! use sphinxql::{Compiler, CompilerConfig, FieldDef, FieldKind, IndexSchema, Query};
//!
//! let schema = IndexSchema::new(
//!     "products",
//!     vec![
//!         FieldDef::id(),
//!         FieldDef::new("price", FieldKind::Integer),
//!         FieldDef::new("name", FieldKind::String).with_default(""),
//!     ],
//! );
//! let config = CompilerConfig::default();
//! let compiler = Compiler::new(&schema, &config);
//!
//! // fixed-width attributes are updated in place
//! let update = Query::update().filter("pk", 7).set("price", 10);
//! assert_eq!(
//!     compiler.compile(&update).unwrap().sql,
//!     "UPDATE products SET price=%s WHERE id = %s"
//! );
//!
//! // string attributes need the whole document
//! let replace = Query::update().filter("pk", 7).set("name", "boots").set("price", 10);
//! assert_eq!(
//!     compiler.compile(&replace).unwrap().sql,
//!     "REPLACE INTO products (id, price, name) VALUES (%s, %s, %s)"
//! );
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compiler;
pub mod config;
pub mod error;
pub mod schema;
pub mod session;
pub mod types;

// Re-export commonly used types at crate root
pub use compiler::{CompiledStatement, Compiler, SqlFragment, UpdateStrategy};
pub use config::{CompilerConfig, ParamStyle};
pub use error::{ExecutorError, SphinxError, SphinxResult, TypeError, ValidationError};
pub use schema::{ColumnRendering, FieldClass, FieldDef, FieldKind, IndexSchema, ModelMeta};
pub use session::{Executor, Session};
pub use types::{
    Aggregate, Direction, Filter, GroupSpec, Lookup, MatchSpec, OptionValue, OrderBy, Query,
    Row, SelectItem, SqlValue, StatementKind, Value, WhereChild, WhereNode,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
