//! Errors raised while planning or executing a query.

/// Errors surfaced by the query planner.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The SQL-dialect query text could not be parsed.
    #[error("query parse error: {0}")]
    Parse(#[from] lattice_core::sql::ParseError),

    /// The repository port failed.
    #[error(transparent)]
    Storage(#[from] lattice_storage::StorageError),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    /// `true` if the repository's underlying error references an absent
    /// index table -- the "no mapping" case is handled by the planner
    /// itself, so this only fires on genuine on-disk corruption.
    pub fn is_index_table_missing(&self) -> bool {
        matches!(
            self,
            QueryError::Storage(lattice_storage::StorageError::IndexTableMissing { .. })
        )
    }
}
