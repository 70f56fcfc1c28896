//! Document persistence.

use rusqlite::{params, Connection, OptionalExtension};

use lattice_core::model::Document;

use crate::error::{Result, StorageError};
use crate::sqlite::schemas::parse_datetime;
use crate::sqlite::store::SqliteRepository;

pub(crate) fn create_document_on_conn(conn: &Connection, d: &Document) -> Result<()> {
    conn.execute(
        "INSERT INTO documents
            (id, collection_id, schema_id, name, created_at, updated_at, content_length, sha256)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            d.id,
            d.collection_id,
            d.schema_id,
            d.name,
            d.created_at.to_rfc3339(),
            d.updated_at.to_rfc3339(),
            d.content_length as i64,
            d.sha256,
        ],
    )?;
    for label in &d.labels {
        super::labels_tags::add_label_on_conn(conn, &d.id, label)?;
    }
    for (k, v) in &d.tags {
        super::labels_tags::add_tag_on_conn(
            conn,
            super::labels_tags::TagOwnerRef::Document(&d.id),
            k,
            v,
        )?;
    }
    Ok(())
}

pub(crate) fn get_document_on_conn(conn: &Connection, id: &str) -> Result<Document> {
    let mut doc = conn
        .query_row(
            "SELECT id, collection_id, schema_id, name, created_at, updated_at, content_length, sha256
             FROM documents WHERE id = ?1",
            params![id],
            scan_document,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("document", id))?;
    doc.labels = super::labels_tags::get_labels_on_conn(conn, &doc.id)?;
    doc.tags =
        super::labels_tags::get_tags_on_conn(conn, super::labels_tags::TagOwnerRef::Document(&doc.id))?;
    Ok(doc)
}

pub(crate) fn delete_document_on_conn(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StorageError::not_found("document", id));
    }
    Ok(())
}

pub(crate) fn list_documents_by_collection_on_conn(
    conn: &Connection,
    collection_id: &str,
) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT id, collection_id, schema_id, name, created_at, updated_at, content_length, sha256
         FROM documents WHERE collection_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![collection_id], scan_document)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(crate) fn count_documents_by_collection_on_conn(
    conn: &Connection,
    collection_id: &str,
) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection_id = ?1",
        params![collection_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub(crate) fn get_documents_by_ids_on_conn(
    conn: &Connection,
    ids: &[String],
) -> Result<Vec<Document>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT id, collection_id, schema_id, name, created_at, updated_at, content_length, sha256
         FROM documents WHERE id IN ({placeholders})"
    );
    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
    let rows = stmt.query_map(params.as_slice(), scan_document)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn scan_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let content_length: i64 = row.get(6)?;
    Ok(Document {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        schema_id: row.get(2)?,
        name: row.get(3)?,
        labels: Vec::new(),
        tags: std::collections::HashMap::new(),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
        content_length: content_length as u64,
        sha256: row.get(7)?,
    })
}

impl SqliteRepository {
    pub fn create_document_impl(&self, d: &Document) -> Result<()> {
        let conn = self.lock_conn()?;
        create_document_on_conn(&conn, d)
    }

    pub fn get_document_impl(&self, id: &str) -> Result<Document> {
        let conn = self.lock_conn()?;
        get_document_on_conn(&conn, id)
    }

    pub fn delete_document_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_document_on_conn(&conn, id)
    }

    pub fn list_documents_by_collection_impl(&self, collection_id: &str) -> Result<Vec<Document>> {
        let conn = self.lock_conn()?;
        list_documents_by_collection_on_conn(&conn, collection_id)
    }

    pub fn count_documents_by_collection_impl(&self, collection_id: &str) -> Result<i64> {
        let conn = self.lock_conn()?;
        count_documents_by_collection_on_conn(&conn, collection_id)
    }

    pub fn get_documents_by_ids_impl(&self, ids: &[String]) -> Result<Vec<Document>> {
        let conn = self.lock_conn()?;
        get_documents_by_ids_on_conn(&conn, ids)
    }
}
