//! Shared test infrastructure for the SphinxQL compiler.

#![allow(dead_code)]

pub mod executor;
pub mod fixtures;

pub use executor::*;
pub use fixtures::*;
