//! The SphinxQL compiler.
//!
//! Compilation runs leaf to root:
//!
//! 1. [`rewriter`] splits the predicate tree into generic predicates,
//!    engine-native conditions and full-text match terms, using the
//!    per-class handlers in [`lookups`].
//! 2. [`match_expr`] serializes the match specification into `MATCH('...')`,
//!    with literal text escaped by [`escape`].
//! 3. [`base`] renders the clauses every statement shares.
//! 4. [`assembler`] gives them the engine's shape. Updates go through
//!    [`update`] to choose between UPDATE and REPLACE.

pub mod assembler;
pub mod base;
pub mod escape;
pub mod fragment;
pub mod lookups;
pub mod match_expr;
pub mod rewriter;
pub mod update;

pub use assembler::Compiler;
pub use fragment::{CompiledStatement, SqlFragment};
pub use update::UpdateStrategy;
