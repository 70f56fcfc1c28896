//! Errors raised by ingestion and rebuild.

use lattice_core::validate::FieldValidationError;

use crate::rebuild::RebuildResult;

/// Errors surfaced by [`crate::pipeline::ingest`] and [`crate::rebuild::rebuild`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The target collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The document failed schema validation under the collection's
    /// enforcement mode.
    #[error("schema validation failed with {} error(s)", .0.len())]
    SchemaValidationFailed(Vec<FieldValidationError>),

    /// The document body was not valid JSON.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The repository port failed.
    #[error(transparent)]
    Repository(#[from] lattice_storage::StorageError),

    /// Writing or reading a document body on disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled; carries the partial rebuild outcome.
    #[error("cancelled after {} document(s)", .0.documents_processed)]
    Cancelled(RebuildResult),

    /// A core invariant was found broken at runtime.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, IngestError>;
