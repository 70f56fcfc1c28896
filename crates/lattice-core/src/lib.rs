//! Core types and algorithms for the Lattice JSON document store.
//!
//! This crate has no I/O: it is the pure-data-and-algorithm layer shared by
//! `lattice-storage`, `lattice-query`, and `lattice-ingest`. It contains the
//! entity model (§3), identifier generation, hash helpers, the JSON
//! flattener and schema extractor, the schema validator, the SQL-dialect
//! parser, and the structured query types.

pub mod cancel;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod hash;
pub mod idgen;
pub mod model;
pub mod query;
pub mod sql;
pub mod validate;

pub use error::{CoreError, Result};
