//! `lattice collection create|delete`.

use anyhow::{Context, Result};
use lattice_core::model::{Collection, EnforcementMode, IndexingMode};
use lattice_storage::Repository;

use crate::cli::{CollectionArgs, CollectionCommands, CollectionCreateArgs, CollectionDeleteArgs};
use crate::context::RuntimeContext;
use crate::output::{format_collection_line, output_json};

pub fn run(ctx: &RuntimeContext, args: &CollectionArgs) -> Result<()> {
    match &args.command {
        CollectionCommands::Create(create_args) => create(ctx, create_args),
        CollectionCommands::Delete(delete_args) => delete(ctx, delete_args),
    }
}

fn create(ctx: &RuntimeContext, args: &CollectionCreateArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;

    let enforcement: EnforcementMode = args
        .enforcement
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --enforcement value")?;
    let indexing: IndexingMode = args
        .indexing
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --indexing value")?;

    let mut collection = Collection::new(&args.name, documents_dir(ctx, &args.name)?);
    collection.schema_enforcement_mode = enforcement;
    collection.indexing_mode = indexing;

    std::fs::create_dir_all(&collection.documents_directory)
        .context("creating documents directory")?;
    repo.create_collection(&collection)?;

    if ctx.json {
        output_json(&collection);
    } else if !ctx.quiet {
        println!("created {}", format_collection_line(&collection));
    }
    Ok(())
}

fn delete(ctx: &RuntimeContext, args: &CollectionDeleteArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;
    repo.delete_collection(&args.id)?;
    if ctx.json {
        output_json(&serde_json::json!({"deleted": args.id}));
    } else if !ctx.quiet {
        println!("deleted {}", args.id);
    }
    Ok(())
}

/// Derives a documents directory for a freshly created collection, sitting
/// next to the database file so `lattice init somewhere.db` and `lattice
/// collection create` can be used without a dedicated flag.
fn documents_dir(ctx: &RuntimeContext, name: &str) -> Result<std::path::PathBuf> {
    let db_path = ctx.require_db_path()?;
    let base = db_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    Ok(base.join("documents").join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_dir_sits_next_to_db() {
        let ctx = RuntimeContext {
            db_path: Some(std::path::PathBuf::from("/tmp/store/lattice.db")),
            json: false,
            verbose: false,
            quiet: false,
        };
        let dir = documents_dir(&ctx, "widgets").unwrap();
        assert_eq!(dir, std::path::PathBuf::from("/tmp/store/documents/widgets"));
    }
}
