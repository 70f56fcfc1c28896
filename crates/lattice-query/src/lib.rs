//! Query planning: resolves a [`lattice_core::query::SearchQuery`] against
//! a [`lattice_storage::Repository`] (§4.7).

pub mod error;
pub mod planner;

pub use error::QueryError;
pub use planner::{run, run_sql};
