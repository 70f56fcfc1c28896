//! SQLite-backed storage for the document store.
//!
//! Provides the [`Repository`] trait, a SQLite implementation
//! ([`SqliteRepository`]), and a plain-filesystem layer for document bodies
//! ([`fs`]).

pub mod error;
pub mod fs;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use sqlite::SqliteRepository;
pub use traits::{Repository, TagOwner};

// ---------------------------------------------------------------------------
// Repository trait implementation for SqliteRepository
// ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};

use lattice_core::model::{
    Collection, Document, FieldConstraint, IndexTableMapping, IndexedValue, Schema, SchemaElement,
};
use lattice_core::query::Condition;

use crate::error::Result;

impl Repository for SqliteRepository {
    fn find_schema_by_hash(&self, hash: &str) -> Result<Option<Schema>> {
        self.find_schema_by_hash_impl(hash)
    }

    fn create_schema(&self, schema: &Schema, elements: &[SchemaElement]) -> Result<()> {
        self.create_schema_impl(schema, elements)
    }

    fn list_schema_elements(&self, schema_id: &str) -> Result<Vec<SchemaElement>> {
        self.list_schema_elements_impl(schema_id)
    }

    fn create_collection(&self, c: &Collection) -> Result<()> {
        self.create_collection_impl(c)
    }

    fn get_collection(&self, id: &str) -> Result<Collection> {
        self.get_collection_impl(id)
    }

    fn delete_collection(&self, id: &str) -> Result<()> {
        self.delete_collection_impl(id)
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        self.list_collections_impl()
    }

    fn set_field_constraints(&self, collection_id: &str, c: &[FieldConstraint]) -> Result<()> {
        self.set_field_constraints_impl(collection_id, c)
    }

    fn list_field_constraints(&self, collection_id: &str) -> Result<Vec<FieldConstraint>> {
        self.list_field_constraints_impl(collection_id)
    }

    fn set_indexed_fields(&self, collection_id: &str, fields: &[String]) -> Result<()> {
        self.set_indexed_fields_impl(collection_id, fields)
    }

    fn list_indexed_fields(&self, collection_id: &str) -> Result<Vec<String>> {
        self.list_indexed_fields_impl(collection_id)
    }

    fn create_document(&self, d: &Document) -> Result<()> {
        self.create_document_impl(d)
    }

    fn get_document(&self, id: &str) -> Result<Document> {
        self.get_document_impl(id)
    }

    fn delete_document(&self, id: &str) -> Result<()> {
        self.delete_document_impl(id)
    }

    fn list_documents_by_collection(&self, collection_id: &str) -> Result<Vec<Document>> {
        self.list_documents_by_collection_impl(collection_id)
    }

    fn count_documents_by_collection(&self, collection_id: &str) -> Result<i64> {
        self.count_documents_by_collection_impl(collection_id)
    }

    fn get_documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        self.get_documents_by_ids_impl(ids)
    }

    fn find_index_mapping(&self, path: &str) -> Result<Option<IndexTableMapping>> {
        self.find_index_mapping_impl(path)
    }

    fn create_index_mapping(&self, m: &IndexTableMapping) -> Result<()> {
        self.create_index_mapping_impl(m)
    }

    fn list_index_tables_for_collection(
        &self,
        collection_id: &str,
    ) -> Result<Vec<IndexTableMapping>> {
        self.list_index_tables_for_collection_impl(collection_id)
    }

    fn ensure_index_table(&self, table_name: &str) -> Result<()> {
        self.ensure_index_table_impl(table_name)
    }

    fn insert_index_values(&self, table_name: &str, rows: &[IndexedValue]) -> Result<()> {
        self.insert_index_values_impl(table_name, rows)
    }

    fn scan_index_table(
        &self,
        table_name: &str,
        condition: Condition,
        value: Option<&str>,
    ) -> Result<HashSet<String>> {
        self.scan_index_table_impl(table_name, condition, value)
    }

    fn delete_index_values_for_collection(
        &self,
        table_name: &str,
        collection_id: &str,
    ) -> Result<()> {
        self.delete_index_values_for_collection_impl(table_name, collection_id)
    }

    fn delete_index_values_for_document(&self, document_id: &str) -> Result<()> {
        self.delete_index_values_for_document_impl(document_id)
    }

    fn add_label(&self, document_id: &str, label: &str) -> Result<()> {
        self.add_label_impl(document_id, label)
    }

    fn get_labels(&self, document_id: &str) -> Result<Vec<String>> {
        self.get_labels_impl(document_id)
    }

    fn add_tag(&self, owner: TagOwner, key: &str, value: &str) -> Result<()> {
        self.add_tag_impl(owner, key, value)
    }

    fn get_tags(&self, owner: TagOwner) -> Result<HashMap<String, String>> {
        self.get_tags_impl(owner)
    }

    fn documents_with_labels(&self, collection_id: &str, labels: &[String]) -> Result<HashSet<String>> {
        self.documents_with_labels_impl(collection_id, labels)
    }

    fn documents_with_tags(
        &self,
        collection_id: &str,
        tags: &HashMap<String, String>,
    ) -> Result<HashSet<String>> {
        self.documents_with_tags_impl(collection_id, tags)
    }

    fn run_in_transaction(&self, f: &dyn Fn(&dyn Repository) -> Result<()>) -> Result<()> {
        self.run_in_transaction_impl(f)
    }
}
