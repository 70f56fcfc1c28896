//! Output formatting helpers for the `lattice` CLI.
//!
//! Provides JSON output and human-readable rendering for collections,
//! documents, and query results.

use std::io::{self, Write};

use lattice_core::model::{Collection, Document};
use lattice_core::query::QueryResult;
use serde::Serialize;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Each row is a `Vec<String>` with columns matching the headers.
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

/// Format a collection as a single human-readable summary line.
pub fn format_collection_line(c: &Collection) -> String {
    format!(
        "{} {} (enforcement={}, indexing={})",
        c.id, c.name, c.schema_enforcement_mode, c.indexing_mode
    )
}

/// Format a document's metadata as a multi-line human-readable block.
pub fn format_document_detail(d: &Document) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} (collection {})", d.id, d.collection_id));
    if let Some(ref name) = d.name {
        lines.push(format!("Name: {}", name));
    }
    lines.push(format!("Schema: {}", d.schema_id));
    lines.push(format!(
        "Size: {} bytes, sha256: {}",
        d.content_length, d.sha256
    ));
    lines.push(format!(
        "Created: {}",
        d.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!(
        "Updated: {}",
        d.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    if !d.labels.is_empty() {
        lines.push(format!("Labels: {}", d.labels.join(", ")));
    }
    if !d.tags.is_empty() {
        let mut tags: Vec<String> = d.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        tags.sort();
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    lines.join("\n")
}

/// Format a document as a row for [`output_table`].
pub fn format_document_row(d: &Document) -> Vec<String> {
    vec![
        d.id.clone(),
        d.name.clone().unwrap_or_default(),
        d.created_at.to_rfc3339(),
        d.labels.join(","),
    ]
}

/// Summarize a query result as a trailer line printed after the table.
pub fn format_query_summary(r: &QueryResult) -> String {
    format!(
        "{} of {} records ({} remaining, end_of_results={})",
        r.documents.len(),
        r.total_records,
        r.records_remaining,
        r.end_of_results
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn collection_line_includes_modes() {
        let c = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        let line = format_collection_line(&c);
        assert!(line.contains("widgets"));
        assert!(line.contains("enforcement=none"));
        assert!(line.contains("indexing=all"));
    }

    #[test]
    fn document_detail_includes_labels() {
        let mut d = Document::new("col_1", "sch_1", 10, "abc".into());
        d.labels = vec!["urgent".to_string()];
        let detail = format_document_detail(&d);
        assert!(detail.contains("Labels: urgent"));
    }

    #[test]
    fn document_row_columns() {
        let mut d = Document::new("col_1", "sch_1", 10, "abc".into());
        d.name = Some("thing".into());
        let row = format_document_row(&d);
        assert_eq!(row[0], d.id);
        assert_eq!(row[1], "thing");
    }

    #[test]
    fn table_output_smoke() {
        let headers = &["ID", "Name"];
        let rows = vec![vec!["doc_1".into(), "a".into()]];
        output_table(headers, &rows);
    }

    #[test]
    fn query_summary_reports_remaining() {
        let r = QueryResult::new(vec![], 5, 0);
        let summary = format_query_summary(&r);
        assert!(summary.contains("5 remaining") || summary.contains("5 remaining)"));
    }
}
