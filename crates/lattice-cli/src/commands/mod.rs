//! Command handlers, one module per subcommand.

pub mod collection;
pub mod get;
pub mod ingest;
pub mod init;
pub mod query;
pub mod rebuild;

use anyhow::Result;
use lattice_storage::SqliteRepository;

use crate::context::RuntimeContext;

/// Opens the repository at the context's resolved database path.
pub(crate) fn open_repository(ctx: &RuntimeContext) -> Result<SqliteRepository> {
    let path = ctx.require_db_path()?;
    Ok(SqliteRepository::open(path)?)
}
