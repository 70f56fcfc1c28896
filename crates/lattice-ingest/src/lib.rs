//! Orchestrates `lattice-core` and `lattice-storage` into the two
//! document-store operations that touch every subsystem at once: ingesting
//! a document (§4.8) and rebuilding a collection's indexes (§4.9).

pub mod error;
pub mod pipeline;
pub mod rebuild;

pub use error::IngestError;
pub use pipeline::{ingest, IngestOptions};
pub use rebuild::{rebuild, RebuildPhase, RebuildProgress, RebuildResult};
