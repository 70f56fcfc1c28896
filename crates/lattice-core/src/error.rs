//! Error types shared by the core algorithms: flattening, extraction,
//! validation, and SQL-dialect parsing.

/// Errors raised by the document/schema algorithms in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The SQL-dialect query text could not be lexed or parsed.
    #[error("query parse error at position {position}: {message}")]
    QueryParse { position: usize, message: String },

    /// A document body was not valid JSON, or its top level was not an
    /// object (§4.3 only flattens object-rooted documents).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Schema validation found one or more field-level violations.
    #[error("validation failed with {0} error(s)")]
    Validation(usize),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn query_parse(position: usize, message: impl Into<String>) -> Self {
        Self::QueryParse {
            position,
            message: message.into(),
        }
    }
}
