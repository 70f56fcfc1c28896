//! Index-table mapping persistence and dynamic per-path value tables.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};

use lattice_core::model::{IndexTableMapping, IndexedValue};
use lattice_core::query::Condition;

use crate::error::{Result, StorageError};
use crate::sqlite::schema::{create_index_table_indexes_sql, create_index_table_sql};
use crate::sqlite::schemas::parse_datetime;
use crate::sqlite::store::SqliteRepository;

pub(crate) fn find_index_mapping_on_conn(
    conn: &Connection,
    path: &str,
) -> Result<Option<IndexTableMapping>> {
    conn.query_row(
        "SELECT id, path, table_name, created_at FROM index_table_mappings WHERE path = ?1",
        params![path],
        scan_mapping,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn create_index_mapping_on_conn(
    conn: &Connection,
    m: &IndexTableMapping,
) -> Result<()> {
    conn.execute(
        "INSERT INTO index_table_mappings (id, path, table_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![m.id, m.path, m.table_name, m.created_at.to_rfc3339()],
    )?;
    Ok(())
}

pub(crate) fn list_index_tables_for_collection_on_conn(
    conn: &Connection,
    collection_id: &str,
) -> Result<Vec<IndexTableMapping>> {
    // A path is "for" a collection if that collection has selected it as an
    // indexed field (global physical tables, per-collection selection).
    let mut stmt = conn.prepare(
        "SELECT m.id, m.path, m.table_name, m.created_at
         FROM index_table_mappings m
         JOIN indexed_fields f ON f.field_path = m.path
         WHERE f.collection_id = ?1",
    )?;
    let rows = stmt.query_map(params![collection_id], scan_mapping)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn scan_mapping(row: &rusqlite::Row) -> rusqlite::Result<IndexTableMapping> {
    let created_at: String = row.get(3)?;
    Ok(IndexTableMapping {
        id: row.get(0)?,
        path: row.get(1)?,
        table_name: row.get(2)?,
        created_at: parse_datetime(&created_at),
    })
}

pub(crate) fn ensure_index_table_on_conn(conn: &Connection, table_name: &str) -> Result<()> {
    conn.execute_batch(&create_index_table_sql(table_name))?;
    for stmt in create_index_table_indexes_sql(table_name) {
        conn.execute_batch(&stmt)?;
    }
    Ok(())
}

pub(crate) fn insert_index_values_on_conn(
    conn: &Connection,
    table_name: &str,
    rows: &[IndexedValue],
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    table_exists(conn, table_name)?;
    let sql = format!(
        r#"INSERT INTO "{table_name}" (id, document_id, position, value) VALUES (?1, ?2, ?3, ?4)"#
    );
    let mut stmt = conn.prepare(&sql)?;
    for row in rows {
        stmt.execute(params![row.id, row.document_id, row.position, row.value])?;
    }
    Ok(())
}

pub(crate) fn scan_index_table_on_conn(
    conn: &Connection,
    table_name: &str,
    condition: Condition,
    value: Option<&str>,
) -> Result<HashSet<String>> {
    table_exists(conn, table_name)?;
    let (clause, needs_value) = match condition {
        Condition::Eq => ("value = ?1", true),
        Condition::Ne => ("value != ?1", true),
        Condition::Gt => ("value > ?1", true),
        Condition::Gte => ("value >= ?1", true),
        Condition::Lt => ("value < ?1", true),
        Condition::Lte => ("value <= ?1", true),
        Condition::IsNull => ("value IS NULL", false),
        Condition::IsNotNull => ("value IS NOT NULL", false),
        Condition::Contains => ("value LIKE ?1 ESCAPE '\\'", true),
        Condition::StartsWith => ("value LIKE ?1 ESCAPE '\\'", true),
        Condition::EndsWith => ("value LIKE ?1 ESCAPE '\\'", true),
    };
    let like_value = match condition {
        Condition::Contains => value.map(|v| format!("%{}%", escape_like(v))),
        Condition::StartsWith => value.map(|v| format!("{}%", escape_like(v))),
        Condition::EndsWith => value.map(|v| format!("%{}", escape_like(v))),
        _ => value.map(|v| v.to_string()),
    };

    let sql = format!(r#"SELECT document_id FROM "{table_name}" WHERE {clause}"#);
    let mut stmt = conn.prepare(&sql)?;
    let mut out = HashSet::new();
    if needs_value {
        let rows = stmt.query_map(params![like_value], |row| row.get::<_, String>(0))?;
        for row in rows {
            out.insert(row?);
        }
    } else {
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for row in rows {
            out.insert(row?);
        }
    }
    Ok(out)
}

pub(crate) fn delete_index_values_for_collection_on_conn(
    conn: &Connection,
    table_name: &str,
    collection_id: &str,
) -> Result<()> {
    table_exists(conn, table_name)?;
    let sql = format!(
        r#"DELETE FROM "{table_name}" WHERE document_id IN
           (SELECT id FROM documents WHERE collection_id = ?1)"#
    );
    conn.execute(&sql, params![collection_id])?;
    Ok(())
}

pub(crate) fn delete_index_values_for_document_on_conn(
    conn: &Connection,
    document_id: &str,
) -> Result<()> {
    let mut stmt = conn.prepare("SELECT table_name FROM index_table_mappings")?;
    let table_names: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);
    for table_name in table_names {
        let sql = format!(r#"DELETE FROM "{table_name}" WHERE document_id = ?1"#);
        conn.execute(&sql, params![document_id])?;
    }
    Ok(())
}

/// Escapes `LIKE` wildcard characters in a literal value so it matches
/// itself rather than reintroducing `%`/`_` as SQLite wildcards. Paired
/// with `ESCAPE '\'` on the clause.
fn escape_like(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn table_exists(conn: &Connection, table_name: &str) -> Result<()> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)?;
    if !exists {
        return Err(StorageError::IndexTableMissing {
            table: table_name.to_string(),
            path: table_name.to_string(),
        });
    }
    Ok(())
}

impl SqliteRepository {
    pub fn find_index_mapping_impl(&self, path: &str) -> Result<Option<IndexTableMapping>> {
        let conn = self.lock_conn()?;
        find_index_mapping_on_conn(&conn, path)
    }

    pub fn create_index_mapping_impl(&self, m: &IndexTableMapping) -> Result<()> {
        let conn = self.lock_conn()?;
        create_index_mapping_on_conn(&conn, m)
    }

    pub fn list_index_tables_for_collection_impl(
        &self,
        collection_id: &str,
    ) -> Result<Vec<IndexTableMapping>> {
        let conn = self.lock_conn()?;
        list_index_tables_for_collection_on_conn(&conn, collection_id)
    }

    pub fn ensure_index_table_impl(&self, table_name: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        ensure_index_table_on_conn(&conn, table_name)
    }

    pub fn insert_index_values_impl(&self, table_name: &str, rows: &[IndexedValue]) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_index_values_on_conn(&conn, table_name, rows)
    }

    pub fn scan_index_table_impl(
        &self,
        table_name: &str,
        condition: Condition,
        value: Option<&str>,
    ) -> Result<HashSet<String>> {
        let conn = self.lock_conn()?;
        scan_index_table_on_conn(&conn, table_name, condition, value)
    }

    pub fn delete_index_values_for_collection_impl(
        &self,
        table_name: &str,
        collection_id: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_index_values_for_collection_on_conn(&conn, table_name, collection_id)
    }

    pub fn delete_index_values_for_document_impl(&self, document_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_index_values_for_document_on_conn(&conn, document_id)
    }
}
