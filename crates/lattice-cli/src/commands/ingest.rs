//! `lattice ingest` -- ingest a JSON file into a collection.

use anyhow::{Context, Result};
use lattice_ingest::IngestOptions;

use crate::cli::IngestArgs;
use crate::context::RuntimeContext;
use crate::output::{format_document_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &IngestArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;
    let body = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file))?;

    let opts = IngestOptions {
        name: args.name.clone(),
        labels: args.labels.clone(),
        tags: Default::default(),
    };

    let doc = lattice_ingest::ingest(&repo, &args.collection_id, &body, opts)?;

    if ctx.json {
        output_json(&doc);
    } else if !ctx.quiet {
        println!("{}", format_document_detail(&doc));
    }
    Ok(())
}
