//! `lattice query` -- run a SQL-dialect query against a collection.

use anyhow::Result;

use crate::cli::QueryArgs;
use crate::context::RuntimeContext;
use crate::output::{format_document_row, format_query_summary, output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &QueryArgs) -> Result<()> {
    let repo = super::open_repository(ctx)?;
    let result = lattice_query::run_sql(&repo, &args.collection_id, &args.sql)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "documents": result.documents,
            "total_records": result.total_records,
            "records_remaining": result.records_remaining,
            "end_of_results": result.end_of_results,
        }));
    } else {
        let rows: Vec<Vec<String>> = result.documents.iter().map(format_document_row).collect();
        output_table(&["ID", "Name", "Created", "Labels"], &rows);
        if !ctx.quiet {
            println!("{}", format_query_summary(&result));
        }
    }
    Ok(())
}
