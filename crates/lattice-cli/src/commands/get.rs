//! `lattice get` -- fetch a single document's metadata.

use anyhow::Result;
use lattice_storage::Repository;

use crate::cli::GetArgs;
use crate::context::RuntimeContext;
use crate::output::{format_document_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &GetArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;
    let doc = repo.get_document(&args.document_id)?;

    if ctx.json {
        output_json(&doc);
    } else if !ctx.quiet {
        println!("{}", format_document_detail(&doc));
    }
    Ok(())
}
