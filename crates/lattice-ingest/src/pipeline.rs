//! The ingestion pipeline (§4.8): validate, resolve schema, flatten, index,
//! persist metadata, write the body to disk.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use lattice_core::extract::extract;
use lattice_core::flatten::flatten;
use lattice_core::model::{
    Collection, Document, IndexTableMapping, IndexedValue, Schema, SchemaElement,
};
use lattice_core::model::{EnforcementMode, IndexingMode};
use lattice_core::validate::validate;
use lattice_storage::{fs, Repository, StorageError};

use crate::error::{IngestError, Result};

/// Caller-supplied metadata for one ingest call.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub name: Option<String>,
    pub labels: Vec<String>,
    pub tags: HashMap<String, String>,
}

/// Ingests `body` (raw JSON bytes) into `collection_id`, per §4.8's ten
/// steps. Steps 1-9 run inside one transaction; step 10 (the on-disk write)
/// happens after it commits, with best-effort compensating cleanup on
/// failure.
pub fn ingest(
    repo: &dyn Repository,
    collection_id: &str,
    body: &[u8],
    opts: IngestOptions,
) -> Result<Document> {
    // Step 1: resolve collection.
    let collection = repo.get_collection(collection_id).map_err(|e| match e {
        StorageError::NotFound { .. } => IngestError::CollectionNotFound(collection_id.to_string()),
        other => IngestError::Repository(other),
    })?;

    // Parse and validate the document shape up front; neither depends on a
    // transaction.
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| IngestError::InvalidDocument(e.to_string()))?;

    if collection.schema_enforcement_mode != EnforcementMode::None {
        let constraints = repo.list_field_constraints(collection_id)?;
        validate(&value, collection.schema_enforcement_mode, &constraints)
            .map_err(IngestError::SchemaValidationFailed)?;
    }

    let content_length = body.len() as u64;
    let sha256 = format!("{:x}", Sha256::digest(body));

    let indexed_fields: HashSet<String> = if collection.indexing_mode == IndexingMode::Selective {
        repo.list_indexed_fields(collection_id)?.into_iter().collect()
    } else {
        HashSet::new()
    };

    let document = std::cell::RefCell::new(None::<Document>);

    repo.run_in_transaction(&|tx| {
        // Step 3: schema resolution by fingerprint.
        let extraction = extract(&value);
        let schema = match tx.find_schema_by_hash(&extraction.fingerprint)? {
            Some(existing) => existing,
            None => {
                let schema = Schema::new(extraction.fingerprint.clone());
                let elements: Vec<SchemaElement> = extraction
                    .elements
                    .iter()
                    .map(|e| {
                        SchemaElement::new(&schema.id, e.position, e.key.clone(), e.datatype.clone(), e.nullable)
                    })
                    .collect();
                tx.create_schema(&schema, &elements)?;
                schema
            }
        };

        // Step 4 & 5: flatten, then apply the indexing policy.
        let leaves = flatten(&value);
        let retained: Vec<_> = match collection.indexing_mode {
            IndexingMode::All => leaves.iter().collect(),
            IndexingMode::None => Vec::new(),
            IndexingMode::Selective => leaves
                .iter()
                .filter(|l| indexed_fields.contains(&l.path))
                .collect(),
        };

        // Step 7: document row.
        let mut doc = Document::new(&collection.id, &schema.id, content_length, sha256.clone());
        doc.name = opts.name.clone();
        doc.labels = opts.labels.clone();
        doc.tags = opts.tags.clone();
        tx.create_document(&doc)?;

        // Step 6 & 9: per-path index tables and value rows.
        let mut by_path: HashMap<&str, Vec<&lattice_core::flatten::FlattenedValue>> = HashMap::new();
        for leaf in &retained {
            by_path.entry(leaf.path.as_str()).or_default().push(leaf);
        }
        for (path, leaves) in by_path {
            let mapping = ensure_mapping_for_path(tx, path)?;
            let rows: Vec<IndexedValue> = leaves
                .iter()
                .map(|l| IndexedValue::new(doc.id.clone(), l.position, l.value.clone()))
                .collect();
            tx.insert_index_values(&mapping.table_name, &rows)?;
        }

        *document.borrow_mut() = Some(doc);
        Ok(())
    })?;

    let doc = document.into_inner().expect("closure always sets this on Ok");

    // Step 10: disk write, after commit.
    let path = collection.document_path(&doc.id);
    if let Err(e) = fs::write_document_body(&path, body) {
        error!(document_id = %doc.id, error = %e, "failed to write document body, compensating metadata cleanup");
        if let Err(cleanup_err) = repo.delete_document(&doc.id) {
            error!(document_id = %doc.id, error = %cleanup_err, "compensating cleanup also failed");
        }
        return Err(IngestError::Io(e));
    }

    info!(document_id = %doc.id, collection_id = %collection.id, "document ingested");
    Ok(doc)
}

/// Resolves (or creates) the index-table-mapping for `path`, handling the
/// race where two concurrent ingestions of a new path both try to create
/// the mapping: the loser's unique-constraint violation is treated as
/// "look it up and reuse" rather than propagated.
fn ensure_mapping_for_path(
    repo: &dyn Repository,
    path: &str,
) -> lattice_storage::error::Result<IndexTableMapping> {
    if let Some(existing) = repo.find_index_mapping(path)? {
        repo.ensure_index_table(&existing.table_name)?;
        return Ok(existing);
    }

    let mapping = IndexTableMapping::new(path);
    match repo.create_index_mapping(&mapping) {
        Ok(()) => {
            repo.ensure_index_table(&mapping.table_name)?;
            Ok(mapping)
        }
        Err(StorageError::Query(e)) if is_unique_violation(&e) => {
            debug!(path, "index mapping race lost, reusing winner's row");
            let existing = repo
                .find_index_mapping(path)?
                .ok_or_else(|| StorageError::InvariantViolation(format!(
                    "mapping for {path} vanished after unique-constraint race"
                )))?;
            repo.ensure_index_table(&existing.table_name)?;
            Ok(existing)
        }
        Err(other) => Err(other),
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_storage::SqliteRepository;
    use serde_json::json;

    fn setup(indexing_mode: IndexingMode) -> (SqliteRepository, String, tempfile::TempDir) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("widgets", dir.path().to_path_buf());
        collection.indexing_mode = indexing_mode;
        repo.create_collection(&collection).unwrap();
        (repo, collection.id, dir)
    }

    #[test]
    fn ingest_unknown_collection_errors() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = ingest(&repo, "col_missing", b"{}", IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::CollectionNotFound(_)));
    }

    #[test]
    fn ingest_writes_body_and_index_values() {
        let (repo, collection_id, dir) = setup(IndexingMode::All);
        let body = json!({"email": "u@x", "age": 30}).to_string();

        let doc = ingest(&repo, &collection_id, body.as_bytes(), IngestOptions::default()).unwrap();
        assert_eq!(doc.collection_id, collection_id);

        let on_disk = std::fs::read_to_string(dir.path().join(format!("{}.json", doc.id))).unwrap();
        assert_eq!(on_disk, body);

        let email_mapping = repo.find_index_mapping("email").unwrap().unwrap();
        let found = repo
            .scan_index_table(&email_mapping.table_name, lattice_core::query::Condition::Eq, Some("u@x"))
            .unwrap();
        assert!(found.contains(&doc.id));
    }

    #[test]
    fn selective_indexing_only_keeps_named_fields() {
        let (repo, collection_id, _dir) = setup(IndexingMode::Selective);
        repo.set_indexed_fields(&collection_id, &["email".to_string()]).unwrap();

        let body = json!({"email": "u@x", "age": 30}).to_string();
        let doc = ingest(&repo, &collection_id, body.as_bytes(), IngestOptions::default()).unwrap();

        let email_mapping = repo.find_index_mapping("email").unwrap();
        assert!(email_mapping.is_some());
        let found = repo
            .scan_index_table(&email_mapping.unwrap().table_name, lattice_core::query::Condition::Eq, Some("u@x"))
            .unwrap();
        assert!(found.contains(&doc.id));

        assert!(repo.find_index_mapping("age").unwrap().is_none());
    }

    #[test]
    fn none_indexing_mode_discards_all_values() {
        let (repo, collection_id, _dir) = setup(IndexingMode::None);
        let body = json!({"email": "u@x"}).to_string();
        ingest(&repo, &collection_id, body.as_bytes(), IngestOptions::default()).unwrap();
        assert!(repo.find_index_mapping("email").unwrap().is_none());
    }

    #[test]
    fn schema_dedup_across_documents() {
        let (repo, collection_id, _dir) = setup(IndexingMode::All);
        let a = ingest(&repo, &collection_id, json!({"a": 1, "b": "x"}).to_string().as_bytes(), IngestOptions::default()).unwrap();
        let b = ingest(&repo, &collection_id, json!({"b": "y", "a": 2}).to_string().as_bytes(), IngestOptions::default()).unwrap();
        assert_eq!(a.schema_id, b.schema_id);
    }

    #[test]
    fn strict_mode_rejects_unexpected_field() {
        let (repo, collection_id, _dir) = setup(IndexingMode::All);
        let mut collection = repo.get_collection(&collection_id).unwrap();
        collection.schema_enforcement_mode = EnforcementMode::Strict;
        // collections table has no update helper in this port; recreate via
        // delete+create to flip the mode for this test.
        repo.delete_collection(&collection_id).unwrap();
        repo.create_collection(&collection).unwrap();
        repo.set_field_constraints(
            &collection_id,
            &[lattice_core::model::FieldConstraint::new(&collection_id, "email", lattice_core::model::DataType::String).required(true)],
        )
        .unwrap();

        let err = ingest(
            &repo,
            &collection_id,
            json!({"email": "u@x", "extra": 1}).to_string().as_bytes(),
            IngestOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::SchemaValidationFailed(_)));
    }

    #[test]
    fn labels_and_tags_round_trip() {
        let (repo, collection_id, _dir) = setup(IndexingMode::All);
        let opts = IngestOptions {
            name: Some("doc-1".into()),
            labels: vec!["urgent".into()],
            tags: HashMap::from([("env".to_string(), "dev".to_string())]),
        };
        let doc = ingest(&repo, &collection_id, b"{}", opts).unwrap();
        let found = repo.get_document(&doc.id).unwrap();
        assert_eq!(found.name.as_deref(), Some("doc-1"));
        assert_eq!(found.labels, vec!["urgent".to_string()]);
        assert_eq!(found.tags.get("env").map(String::as_str), Some("dev"));
    }

    #[test]
    fn invalid_json_body_is_rejected() {
        let (repo, collection_id, _dir) = setup(IndexingMode::All);
        let err = ingest(&repo, &collection_id, b"not json", IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDocument(_)));
    }
}
