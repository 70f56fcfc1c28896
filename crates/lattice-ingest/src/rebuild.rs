//! The rebuild engine (§4.9): reindexes a collection under its current
//! indexing policy, with progress reporting and cooperative cancellation.

use std::collections::HashMap;

use tracing::{info, warn};

use lattice_core::cancel::CancellationToken;
use lattice_core::flatten::flatten;
use lattice_core::model::{IndexTableMapping, IndexedValue};
use lattice_core::model::IndexingMode;
use lattice_storage::{fs, Repository};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    Scanning,
    Dropping,
    Clearing,
    Indexing,
}

#[derive(Debug, Clone, Copy)]
pub struct RebuildProgress {
    pub phase: RebuildPhase,
    pub documents_processed: i64,
    pub documents_total: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RebuildResult {
    pub success: bool,
    pub documents_processed: i64,
    pub indexes_dropped: i64,
    pub errors: Vec<(String, String)>,
}

/// Reindexes every document in `collection_id` under its current policy.
///
/// Phase 2 (dropping unused index tables) only runs when `drop_unused` is
/// set and the collection's indexing mode is `Selective` -- there is
/// nothing to "drop unused" under `All` or `None`, every path is either
/// kept or discarded uniformly. Cancellation is checked between documents
/// and at each phase boundary; a cancelled run raises
/// [`IngestError::Cancelled`] carrying the partial result, never silently
/// reporting success.
pub fn rebuild(
    repo: &dyn Repository,
    collection_id: &str,
    drop_unused: bool,
    progress: &mut dyn FnMut(RebuildProgress),
    cancel: &CancellationToken,
) -> Result<RebuildResult> {
    let collection = repo.get_collection(collection_id)?;
    let mut result = RebuildResult::default();

    // Phase 1: scanning.
    let documents = repo.list_documents_by_collection(collection_id)?;
    let total = documents.len() as i64;
    progress(RebuildProgress {
        phase: RebuildPhase::Scanning,
        documents_processed: 0,
        documents_total: total,
    });
    if cancel.is_cancelled() {
        return Err(IngestError::Cancelled(result));
    }

    // Phase 2: dropping tables for paths no longer selected.
    let touched = repo.list_index_tables_for_collection(collection_id)?;
    if drop_unused && collection.indexing_mode == IndexingMode::Selective {
        let indexed_fields: std::collections::HashSet<String> =
            repo.list_indexed_fields(collection_id)?.into_iter().collect();
        for mapping in &touched {
            if !indexed_fields.contains(&mapping.path) {
                repo.delete_index_values_for_collection(&mapping.table_name, collection_id)?;
                result.indexes_dropped += 1;
            }
        }
        progress(RebuildProgress {
            phase: RebuildPhase::Dropping,
            documents_processed: 0,
            documents_total: total,
        });
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled(result));
        }
    }

    // Phase 3: clearing every value row this collection currently owns, so
    // phase 4 starts from a clean slate (idempotent reruns).
    for mapping in &touched {
        repo.delete_index_values_for_collection(&mapping.table_name, collection_id)?;
    }
    progress(RebuildProgress {
        phase: RebuildPhase::Clearing,
        documents_processed: 0,
        documents_total: total,
    });
    if cancel.is_cancelled() {
        return Err(IngestError::Cancelled(result));
    }

    // Phase 4: indexing, one document at a time.
    let indexed_fields: std::collections::HashSet<String> =
        if collection.indexing_mode == IndexingMode::Selective {
            repo.list_indexed_fields(collection_id)?.into_iter().collect()
        } else {
            std::collections::HashSet::new()
        };

    for doc in &documents {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled(result));
        }

        match reindex_one(repo, &collection, doc, &indexed_fields) {
            Ok(()) => {}
            Err(e) => {
                warn!(document_id = %doc.id, error = %e, "rebuild: document failed, continuing");
                result.errors.push((doc.id.clone(), e.to_string()));
            }
        }

        result.documents_processed += 1;
        progress(RebuildProgress {
            phase: RebuildPhase::Indexing,
            documents_processed: result.documents_processed,
            documents_total: total,
        });
    }

    result.success = result.errors.is_empty();
    info!(
        collection_id,
        documents_processed = result.documents_processed,
        indexes_dropped = result.indexes_dropped,
        errors = result.errors.len(),
        "rebuild complete"
    );
    Ok(result)
}

fn reindex_one(
    repo: &dyn Repository,
    collection: &lattice_core::model::Collection,
    doc: &lattice_core::model::Document,
    indexed_fields: &std::collections::HashSet<String>,
) -> std::result::Result<(), IngestError> {
    let path = collection.document_path(&doc.id);
    let body = fs::read_document_body(&path)?;
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| IngestError::InvalidDocument(e.to_string()))?;

    let leaves = flatten(&value);
    let retained: Vec<_> = match collection.indexing_mode {
        IndexingMode::All => leaves.iter().collect(),
        IndexingMode::None => Vec::new(),
        IndexingMode::Selective => leaves.iter().filter(|l| indexed_fields.contains(&l.path)).collect(),
    };

    let mut by_path: HashMap<&str, Vec<&lattice_core::flatten::FlattenedValue>> = HashMap::new();
    for leaf in &retained {
        by_path.entry(leaf.path.as_str()).or_default().push(leaf);
    }

    for (path, leaves) in by_path {
        let mapping = match repo.find_index_mapping(path)? {
            Some(m) => m,
            None => {
                let m = IndexTableMapping::new(path);
                repo.create_index_mapping(&m)?;
                m
            }
        };
        repo.ensure_index_table(&mapping.table_name)?;
        let rows: Vec<IndexedValue> = leaves
            .iter()
            .map(|l| IndexedValue::new(doc.id.clone(), l.position, l.value.clone()))
            .collect();
        repo.insert_index_values(&mapping.table_name, &rows)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::model::{Collection, Document, Schema};
    use lattice_storage::SqliteRepository;
    use serde_json::json;

    fn setup() -> (SqliteRepository, Collection, tempfile::TempDir) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let collection = Collection::new("widgets", dir.path().to_path_buf());
        repo.create_collection(&collection).unwrap();
        (repo, collection, dir)
    }

    fn seed_document(repo: &SqliteRepository, collection: &Collection, body: &serde_json::Value) -> Document {
        let schema = Schema::new("h".into());
        repo.create_schema(&schema, &[]).ok();
        let bytes = body.to_string();
        let doc = Document::new(&collection.id, &schema.id, bytes.len() as u64, "x".into());
        repo.create_document(&doc).unwrap();
        fs::write_document_body(&collection.document_path(&doc.id), bytes.as_bytes()).unwrap();
        doc
    }

    #[test]
    fn rebuild_reindexes_all_documents() {
        let (repo, collection, _dir) = setup();
        let doc = seed_document(&repo, &collection, &json!({"a": 1}));

        let mut events = Vec::new();
        let cancel = CancellationToken::new();
        let result = rebuild(&repo, &collection.id, false, &mut |p| events.push(p), &cancel).unwrap();

        assert!(result.success);
        assert_eq!(result.documents_processed, 1);
        let mapping = repo.find_index_mapping("a").unwrap().unwrap();
        let found = repo
            .scan_index_table(&mapping.table_name, lattice_core::query::Condition::Eq, Some("1"))
            .unwrap();
        assert!(found.contains(&doc.id));
    }

    #[test]
    fn rebuild_with_drop_unused_clears_deselected_paths() {
        let (repo, mut collection, _dir) = setup();
        collection.indexing_mode = IndexingMode::All;
        repo.delete_collection(&collection.id).unwrap();
        repo.create_collection(&collection).unwrap();

        for _ in 0..5 {
            seed_document(&repo, &collection, &json!({"a": 1, "b": 2, "c": 3}));
        }
        let mut events = Vec::new();
        let cancel = CancellationToken::new();
        rebuild(&repo, &collection.id, false, &mut |p| events.push(p), &cancel).unwrap();

        // Switch to selective, keeping only `a`, and rebuild with drop_unused.
        let mut collection = repo.get_collection(&collection.id).unwrap();
        collection.indexing_mode = IndexingMode::Selective;
        repo.delete_collection(&collection.id).unwrap();
        repo.create_collection(&collection).unwrap();
        repo.set_indexed_fields(&collection.id, &["a".to_string()]).unwrap();

        for _ in 0..5 {
            seed_document(&repo, &collection, &json!({"a": 1, "b": 2, "c": 3}));
        }

        let mut events = Vec::new();
        let result = rebuild(&repo, &collection.id, true, &mut |p| events.push(p), &cancel).unwrap();
        assert!(result.success);
        assert_eq!(result.documents_processed, 5);
    }

    #[test]
    fn cancellation_before_start_raises_cancelled_with_partial_result() {
        let (repo, collection, _dir) = setup();
        seed_document(&repo, &collection, &json!({"a": 1}));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = rebuild(&repo, &collection.id, false, &mut |_| {}, &cancel).unwrap_err();
        assert!(matches!(err, IngestError::Cancelled(_)));
    }

    #[test]
    fn missing_body_is_collected_as_a_per_document_error() {
        let (repo, collection, _dir) = setup();
        let schema = Schema::new("h".into());
        repo.create_schema(&schema, &[]).unwrap();
        let doc = Document::new(&collection.id, &schema.id, 2, "x".into());
        repo.create_document(&doc).unwrap();
        // Deliberately no body file written to disk.

        let cancel = CancellationToken::new();
        let result = rebuild(&repo, &collection.id, false, &mut |_| {}, &cancel).unwrap();
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0, doc.id);
    }
}
