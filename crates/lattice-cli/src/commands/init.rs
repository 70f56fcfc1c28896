//! `lattice init` -- open or create the SQLite store.

use anyhow::Result;
use lattice_storage::{Repository, SqliteRepository};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let repo = SqliteRepository::open(&args.db_path)?;
    let collections = repo.list_collections()?;

    if ctx.json {
        output_json(&serde_json::json!({
            "db_path": args.db_path,
            "collections": collections.len(),
        }));
    } else if !ctx.quiet {
        println!(
            "initialized lattice store at {} ({} collection(s))",
            args.db_path,
            collections.len()
        );
    }
    Ok(())
}
