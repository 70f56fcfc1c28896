//! `lattice rebuild` -- reindex a collection under its current policy.

use anyhow::Result;
use lattice_core::cancel::CancellationToken;

use crate::cli::RebuildArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &RebuildArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).ok();
    }

    let mut last_phase = None;
    let result = lattice_ingest::rebuild(
        &repo,
        &args.collection_id,
        args.drop_unused,
        &mut |progress| {
            if !ctx.quiet && !ctx.json && Some(progress.phase) != last_phase {
                eprintln!(
                    "{:?}: {}/{}",
                    progress.phase, progress.documents_processed, progress.documents_total
                );
                last_phase = Some(progress.phase);
            }
        },
        &cancel,
    );

    match result {
        Ok(result) => {
            if ctx.json {
                output_json(&serde_json::json!({
                    "success": result.success,
                    "documents_processed": result.documents_processed,
                    "indexes_dropped": result.indexes_dropped,
                    "errors": result.errors,
                }));
            } else if !ctx.quiet {
                println!(
                    "rebuilt {} document(s), dropped {} index table(s), {} error(s)",
                    result.documents_processed,
                    result.indexes_dropped,
                    result.errors.len()
                );
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
