//! Transaction wrapper for [`SqliteRepository`].

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use lattice_core::model::{
    Collection, Document, FieldConstraint, IndexTableMapping, IndexedValue, Schema, SchemaElement,
};
use lattice_core::query::Condition;

use crate::error::{Result, StorageError};
use crate::sqlite::{collections, documents, index_tables, labels_tags, schemas, store::SqliteRepository};
use crate::traits::{Repository, TagOwner};

/// A thin wrapper around a connection already inside a transaction. Every
/// method delegates to the same `*_on_conn` helpers used outside a
/// transaction, so the two code paths can never drift apart (§4.10: a
/// single trait, not a `Storage`/`Transaction` split).
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Repository for SqliteTx<'_> {
    fn find_schema_by_hash(&self, hash: &str) -> Result<Option<Schema>> {
        schemas::find_schema_by_hash_on_conn(self.conn, hash)
    }

    fn create_schema(&self, schema: &Schema, elements: &[SchemaElement]) -> Result<()> {
        schemas::create_schema_on_conn(self.conn, schema, elements)
    }

    fn list_schema_elements(&self, schema_id: &str) -> Result<Vec<SchemaElement>> {
        schemas::list_schema_elements_on_conn(self.conn, schema_id)
    }

    fn create_collection(&self, c: &Collection) -> Result<()> {
        collections::create_collection_on_conn(self.conn, c)
    }

    fn get_collection(&self, id: &str) -> Result<Collection> {
        collections::get_collection_on_conn(self.conn, id)
    }

    fn delete_collection(&self, id: &str) -> Result<()> {
        collections::delete_collection_on_conn(self.conn, id)
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        collections::list_collections_on_conn(self.conn)
    }

    fn set_field_constraints(&self, collection_id: &str, c: &[FieldConstraint]) -> Result<()> {
        collections::set_field_constraints_on_conn(self.conn, collection_id, c)
    }

    fn list_field_constraints(&self, collection_id: &str) -> Result<Vec<FieldConstraint>> {
        collections::list_field_constraints_on_conn(self.conn, collection_id)
    }

    fn set_indexed_fields(&self, collection_id: &str, fields: &[String]) -> Result<()> {
        collections::set_indexed_fields_on_conn(self.conn, collection_id, fields)
    }

    fn list_indexed_fields(&self, collection_id: &str) -> Result<Vec<String>> {
        collections::list_indexed_fields_on_conn(self.conn, collection_id)
    }

    fn create_document(&self, d: &Document) -> Result<()> {
        documents::create_document_on_conn(self.conn, d)
    }

    fn get_document(&self, id: &str) -> Result<Document> {
        documents::get_document_on_conn(self.conn, id)
    }

    fn delete_document(&self, id: &str) -> Result<()> {
        documents::delete_document_on_conn(self.conn, id)
    }

    fn list_documents_by_collection(&self, collection_id: &str) -> Result<Vec<Document>> {
        documents::list_documents_by_collection_on_conn(self.conn, collection_id)
    }

    fn count_documents_by_collection(&self, collection_id: &str) -> Result<i64> {
        documents::count_documents_by_collection_on_conn(self.conn, collection_id)
    }

    fn get_documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        documents::get_documents_by_ids_on_conn(self.conn, ids)
    }

    fn find_index_mapping(&self, path: &str) -> Result<Option<IndexTableMapping>> {
        index_tables::find_index_mapping_on_conn(self.conn, path)
    }

    fn create_index_mapping(&self, m: &IndexTableMapping) -> Result<()> {
        index_tables::create_index_mapping_on_conn(self.conn, m)
    }

    fn list_index_tables_for_collection(
        &self,
        collection_id: &str,
    ) -> Result<Vec<IndexTableMapping>> {
        index_tables::list_index_tables_for_collection_on_conn(self.conn, collection_id)
    }

    fn ensure_index_table(&self, table_name: &str) -> Result<()> {
        index_tables::ensure_index_table_on_conn(self.conn, table_name)
    }

    fn insert_index_values(&self, table_name: &str, rows: &[IndexedValue]) -> Result<()> {
        index_tables::insert_index_values_on_conn(self.conn, table_name, rows)
    }

    fn scan_index_table(
        &self,
        table_name: &str,
        condition: Condition,
        value: Option<&str>,
    ) -> Result<HashSet<String>> {
        index_tables::scan_index_table_on_conn(self.conn, table_name, condition, value)
    }

    fn delete_index_values_for_collection(
        &self,
        table_name: &str,
        collection_id: &str,
    ) -> Result<()> {
        index_tables::delete_index_values_for_collection_on_conn(self.conn, table_name, collection_id)
    }

    fn delete_index_values_for_document(&self, document_id: &str) -> Result<()> {
        index_tables::delete_index_values_for_document_on_conn(self.conn, document_id)
    }

    fn add_label(&self, document_id: &str, label: &str) -> Result<()> {
        labels_tags::add_label_on_conn(self.conn, document_id, label)
    }

    fn get_labels(&self, document_id: &str) -> Result<Vec<String>> {
        labels_tags::get_labels_on_conn(self.conn, document_id)
    }

    fn add_tag(&self, owner: TagOwner, key: &str, value: &str) -> Result<()> {
        labels_tags::add_tag_on_conn(self.conn, (&owner).into(), key, value)
    }

    fn get_tags(&self, owner: TagOwner) -> Result<HashMap<String, String>> {
        labels_tags::get_tags_on_conn(self.conn, (&owner).into())
    }

    fn documents_with_labels(&self, collection_id: &str, labels: &[String]) -> Result<HashSet<String>> {
        labels_tags::documents_with_labels_on_conn(self.conn, collection_id, labels)
    }

    fn documents_with_tags(
        &self,
        collection_id: &str,
        tags: &HashMap<String, String>,
    ) -> Result<HashSet<String>> {
        labels_tags::documents_with_tags_on_conn(self.conn, collection_id, tags)
    }

    fn run_in_transaction(&self, f: &dyn Fn(&dyn Repository) -> Result<()>) -> Result<()> {
        // Already inside a transaction; nesting just runs the closure
        // directly against the same connection (SQLite has no true nested
        // transactions without savepoints, which this store doesn't need).
        f(self)
    }
}

impl SqliteRepository {
    /// Runs `f` inside a database transaction, committing on `Ok` and
    /// rolling back on `Err`.
    pub fn run_in_transaction_impl(&self, f: &dyn Fn(&dyn Repository) -> Result<()>) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        let sqlite_tx = SqliteTx { conn: &tx };
        match f(&sqlite_tx) {
            Ok(()) => {
                tx.commit()
                    .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn transaction_commits() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let collection = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        let collection_id = collection.id.clone();

        repo.run_in_transaction_impl(&|tx| {
            tx.create_collection(&collection)?;
            tx.add_tag(TagOwner::Collection(collection_id.clone()), "env", "dev")?;
            Ok(())
        })
        .unwrap();

        let found = repo.get_collection_impl(&collection_id).unwrap();
        assert_eq!(found.name, "widgets");
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let collection = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        let collection_id = collection.id.clone();

        let result = repo.run_in_transaction_impl(&|tx| {
            tx.create_collection(&collection)?;
            Err(StorageError::Internal("forced rollback".into()))
        });
        assert!(result.is_err());

        let err = repo.get_collection_impl(&collection_id).unwrap_err();
        assert!(err.is_not_found());
    }
}
