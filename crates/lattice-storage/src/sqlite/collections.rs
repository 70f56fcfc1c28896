//! Collection, field-constraint, and indexed-field persistence.

use std::path::PathBuf;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use lattice_core::model::{Collection, DataType, EnforcementMode, FieldConstraint, IndexingMode};

use crate::error::{Result, StorageError};
use crate::sqlite::schemas::parse_datetime;
use crate::sqlite::store::SqliteRepository;

pub(crate) fn create_collection_on_conn(conn: &Connection, c: &Collection) -> Result<()> {
    conn.execute(
        "INSERT INTO collections
            (id, name, description, documents_directory, created_at, updated_at,
             schema_enforcement_mode, indexing_mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            c.id,
            c.name,
            c.description,
            c.documents_directory.to_string_lossy(),
            c.created_at.to_rfc3339(),
            c.updated_at.to_rfc3339(),
            c.schema_enforcement_mode.to_string(),
            c.indexing_mode.to_string(),
        ],
    )?;
    for (k, v) in &c.tags {
        conn.execute(
            "INSERT INTO tags (collection_id, key, value) VALUES (?1, ?2, ?3)",
            params![c.id, k, v],
        )?;
    }
    Ok(())
}

pub(crate) fn get_collection_on_conn(conn: &Connection, id: &str) -> Result<Collection> {
    let mut collection = conn
        .query_row(
            "SELECT id, name, description, documents_directory, created_at, updated_at,
                    schema_enforcement_mode, indexing_mode
             FROM collections WHERE id = ?1",
            params![id],
            scan_collection,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("collection", id))?;

    collection.tags = super::labels_tags::get_tags_on_conn(
        conn,
        super::labels_tags::TagOwnerRef::Collection(id),
    )?;
    Ok(collection)
}

pub(crate) fn delete_collection_on_conn(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM collections WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StorageError::not_found("collection", id));
    }
    Ok(())
}

pub(crate) fn list_collections_on_conn(conn: &Connection) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, documents_directory, created_at, updated_at,
                schema_enforcement_mode, indexing_mode
         FROM collections ORDER BY name",
    )?;
    let rows = stmt.query_map([], scan_collection)?;
    let mut out = Vec::new();
    for row in rows {
        let mut c = row?;
        c.tags = super::labels_tags::get_tags_on_conn(
            conn,
            super::labels_tags::TagOwnerRef::Collection(&c.id),
        )?;
        out.push(c);
    }
    Ok(out)
}

fn scan_collection(row: &rusqlite::Row) -> rusqlite::Result<Collection> {
    let dir: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let enforcement: String = row.get(6)?;
    let indexing: String = row.get(7)?;
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        documents_directory: PathBuf::from(dir),
        labels: Vec::new(),
        tags: std::collections::HashMap::new(),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
        schema_enforcement_mode: EnforcementMode::from_str(&enforcement)
            .unwrap_or(EnforcementMode::None),
        indexing_mode: IndexingMode::from_str(&indexing).unwrap_or(IndexingMode::All),
    })
}

pub(crate) fn set_field_constraints_on_conn(
    conn: &Connection,
    collection_id: &str,
    constraints: &[FieldConstraint],
) -> Result<()> {
    conn.execute(
        "DELETE FROM field_constraints WHERE collection_id = ?1",
        params![collection_id],
    )?;
    for c in constraints {
        conn.execute(
            "INSERT INTO field_constraints
                (id, collection_id, field_path, data_type, required, nullable, regex_pattern,
                 min_value, max_value, min_length, max_length, allowed_values,
                 array_element_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                c.id,
                c.collection_id,
                c.field_path,
                c.data_type.to_string(),
                c.required,
                c.nullable,
                c.regex_pattern,
                c.min_value,
                c.max_value,
                c.min_length,
                c.max_length,
                c.allowed_values
                    .as_ref()
                    .map(|v| serde_json::to_string(v))
                    .transpose()?,
                c.array_element_type.as_ref().map(|t| t.to_string()),
                c.created_at.to_rfc3339(),
                c.updated_at.to_rfc3339(),
            ],
        )?;
    }
    Ok(())
}

pub(crate) fn list_field_constraints_on_conn(
    conn: &Connection,
    collection_id: &str,
) -> Result<Vec<FieldConstraint>> {
    let mut stmt = conn.prepare(
        "SELECT id, collection_id, field_path, data_type, required, nullable, regex_pattern,
                min_value, max_value, min_length, max_length, allowed_values,
                array_element_type, created_at, updated_at
         FROM field_constraints WHERE collection_id = ?1",
    )?;
    let rows = stmt.query_map(params![collection_id], scan_field_constraint)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn scan_field_constraint(row: &rusqlite::Row) -> rusqlite::Result<FieldConstraint> {
    let data_type: String = row.get(3)?;
    let allowed_values: Option<String> = row.get(11)?;
    let array_element_type: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;
    Ok(FieldConstraint {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        field_path: row.get(2)?,
        data_type: data_type.parse::<DataType>().unwrap_or(DataType::String),
        required: row.get(4)?,
        nullable: row.get(5)?,
        regex_pattern: row.get(6)?,
        min_value: row.get(7)?,
        max_value: row.get(8)?,
        min_length: row.get(9)?,
        max_length: row.get(10)?,
        allowed_values: allowed_values.and_then(|s| serde_json::from_str(&s).ok()),
        array_element_type: array_element_type.and_then(|s| s.parse::<DataType>().ok()),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub(crate) fn set_indexed_fields_on_conn(
    conn: &Connection,
    collection_id: &str,
    fields: &[String],
) -> Result<()> {
    conn.execute(
        "DELETE FROM indexed_fields WHERE collection_id = ?1",
        params![collection_id],
    )?;
    for field in fields {
        conn.execute(
            "INSERT OR IGNORE INTO indexed_fields (id, collection_id, field_path) VALUES (?1, ?2, ?3)",
            params![
                lattice_core::idgen::generate_id(lattice_core::idgen::prefix::INDEXED_FIELD),
                collection_id,
                field,
            ],
        )?;
    }
    Ok(())
}

pub(crate) fn list_indexed_fields_on_conn(
    conn: &Connection,
    collection_id: &str,
) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT field_path FROM indexed_fields WHERE collection_id = ?1")?;
    let rows = stmt.query_map(params![collection_id], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

impl SqliteRepository {
    pub fn create_collection_impl(&self, c: &Collection) -> Result<()> {
        let conn = self.lock_conn()?;
        create_collection_on_conn(&conn, c)
    }

    pub fn get_collection_impl(&self, id: &str) -> Result<Collection> {
        let conn = self.lock_conn()?;
        get_collection_on_conn(&conn, id)
    }

    pub fn delete_collection_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_collection_on_conn(&conn, id)
    }

    pub fn list_collections_impl(&self) -> Result<Vec<Collection>> {
        let conn = self.lock_conn()?;
        list_collections_on_conn(&conn)
    }

    pub fn set_field_constraints_impl(
        &self,
        collection_id: &str,
        c: &[FieldConstraint],
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        set_field_constraints_on_conn(&conn, collection_id, c)
    }

    pub fn list_field_constraints_impl(&self, collection_id: &str) -> Result<Vec<FieldConstraint>> {
        let conn = self.lock_conn()?;
        list_field_constraints_on_conn(&conn, collection_id)
    }

    pub fn set_indexed_fields_impl(&self, collection_id: &str, fields: &[String]) -> Result<()> {
        let conn = self.lock_conn()?;
        set_indexed_fields_on_conn(&conn, collection_id, fields)
    }

    pub fn list_indexed_fields_impl(&self, collection_id: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        list_indexed_fields_on_conn(&conn, collection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_collection() -> Collection {
        Collection::new("widgets", PathBuf::from("/tmp/widgets"))
    }

    #[test]
    fn create_and_get_collection() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = sample_collection();
        repo.create_collection_impl(&c).unwrap();
        let found = repo.get_collection_impl(&c.id).unwrap();
        assert_eq!(found.name, "widgets");
    }

    #[test]
    fn get_missing_collection_errors() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = repo.get_collection_impl("col_nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_collection_removes_it() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = sample_collection();
        repo.create_collection_impl(&c).unwrap();
        repo.delete_collection_impl(&c.id).unwrap();
        assert!(repo.get_collection_impl(&c.id).is_err());
    }

    #[test]
    fn list_collections_sorted_by_name() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_collection_impl(&Collection::new("zebra", PathBuf::from("/z")))
            .unwrap();
        repo.create_collection_impl(&Collection::new("alpha", PathBuf::from("/a")))
            .unwrap();
        let all = repo.list_collections_impl().unwrap();
        assert_eq!(all[0].name, "alpha");
        assert_eq!(all[1].name, "zebra");
    }

    #[test]
    fn field_constraints_round_trip() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = sample_collection();
        repo.create_collection_impl(&c).unwrap();
        let constraint = FieldConstraint::new(&c.id, "email", DataType::String).required(true);
        repo.set_field_constraints_impl(&c.id, std::slice::from_ref(&constraint))
            .unwrap();
        let found = repo.list_field_constraints_impl(&c.id).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].required);
    }

    #[test]
    fn indexed_fields_round_trip() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = sample_collection();
        repo.create_collection_impl(&c).unwrap();
        repo.set_indexed_fields_impl(&c.id, &["email".into(), "age".into()])
            .unwrap();
        let found = repo.list_indexed_fields_impl(&c.id).unwrap();
        assert_eq!(found.len(), 2);
    }
}
