//! The repository port -- the public API document-store consumers depend on
//! instead of a concrete backend (§4.10).

use std::collections::{HashMap, HashSet};

use lattice_core::model::{
    Collection, Document, FieldConstraint, IndexTableMapping, IndexedValue, Schema, SchemaElement,
};
use lattice_core::query::Condition;

use crate::error::Result;

/// Which entity a tag row is attached to. A tag carries exactly one owner
/// (§3: "the tag row carries exactly one of `collection-id` or
/// `document-id`").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagOwner {
    Collection(String),
    Document(String),
}

/// The persistence contract for collections, schemas, documents, index
/// tables, and labels/tags.
///
/// A single trait, not a `Storage`/`Transaction` split: every method here is
/// meant to be callable both directly and from within a
/// [`Repository::run_in_transaction`] closure.
pub trait Repository: Send + Sync {
    // -- schemas -----------------------------------------------------------
    fn find_schema_by_hash(&self, hash: &str) -> Result<Option<Schema>>;
    fn create_schema(&self, schema: &Schema, elements: &[SchemaElement]) -> Result<()>;
    fn list_schema_elements(&self, schema_id: &str) -> Result<Vec<SchemaElement>>;

    // -- collections ---------------------------------------------------------
    fn create_collection(&self, c: &Collection) -> Result<()>;
    fn get_collection(&self, id: &str) -> Result<Collection>;
    fn delete_collection(&self, id: &str) -> Result<()>;
    fn list_collections(&self) -> Result<Vec<Collection>>;
    fn set_field_constraints(&self, collection_id: &str, c: &[FieldConstraint]) -> Result<()>;
    fn list_field_constraints(&self, collection_id: &str) -> Result<Vec<FieldConstraint>>;
    fn set_indexed_fields(&self, collection_id: &str, fields: &[String]) -> Result<()>;
    fn list_indexed_fields(&self, collection_id: &str) -> Result<Vec<String>>;

    // -- documents -----------------------------------------------------------
    fn create_document(&self, d: &Document) -> Result<()>;
    fn get_document(&self, id: &str) -> Result<Document>;
    fn delete_document(&self, id: &str) -> Result<()>;
    fn list_documents_by_collection(&self, collection_id: &str) -> Result<Vec<Document>>;
    fn count_documents_by_collection(&self, collection_id: &str) -> Result<i64>;
    fn get_documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>>;

    // -- index mappings / tables ----------------------------------------------
    fn find_index_mapping(&self, path: &str) -> Result<Option<IndexTableMapping>>;
    fn create_index_mapping(&self, m: &IndexTableMapping) -> Result<()>;
    fn list_index_tables_for_collection(&self, collection_id: &str)
        -> Result<Vec<IndexTableMapping>>;
    fn ensure_index_table(&self, table_name: &str) -> Result<()>;
    fn insert_index_values(&self, table_name: &str, rows: &[IndexedValue]) -> Result<()>;
    fn scan_index_table(
        &self,
        table_name: &str,
        condition: Condition,
        value: Option<&str>,
    ) -> Result<HashSet<String>>;
    fn delete_index_values_for_collection(&self, table_name: &str, collection_id: &str)
        -> Result<()>;
    fn delete_index_values_for_document(&self, document_id: &str) -> Result<()>;

    // -- labels / tags ---------------------------------------------------------
    fn add_label(&self, document_id: &str, label: &str) -> Result<()>;
    fn get_labels(&self, document_id: &str) -> Result<Vec<String>>;
    fn add_tag(&self, owner: TagOwner, key: &str, value: &str) -> Result<()>;
    fn get_tags(&self, owner: TagOwner) -> Result<HashMap<String, String>>;
    fn documents_with_labels(
        &self,
        collection_id: &str,
        labels: &[String],
    ) -> Result<HashSet<String>>;
    fn documents_with_tags(
        &self,
        collection_id: &str,
        tags: &HashMap<String, String>,
    ) -> Result<HashSet<String>>;

    /// Runs `f` against a repository view whose writes commit atomically on
    /// `Ok` and roll back on `Err`.
    fn run_in_transaction(&self, f: &dyn Fn(&dyn Repository) -> Result<()>) -> Result<()>;
}
