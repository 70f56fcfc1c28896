//! Schema and schema-element persistence.

use rusqlite::{params, Connection, OptionalExtension};

use lattice_core::model::{DataType, Schema, SchemaElement};

use crate::error::Result;
use crate::sqlite::store::SqliteRepository;

pub(crate) fn find_schema_by_hash_on_conn(conn: &Connection, hash: &str) -> Result<Option<Schema>> {
    conn.query_row(
        "SELECT id, hash, created_at FROM schemas WHERE hash = ?1",
        params![hash],
        scan_schema,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn create_schema_on_conn(
    conn: &Connection,
    schema: &Schema,
    elements: &[SchemaElement],
) -> Result<()> {
    conn.execute(
        "INSERT INTO schemas (id, hash, created_at) VALUES (?1, ?2, ?3)",
        params![schema.id, schema.hash, schema.created_at.to_rfc3339()],
    )?;
    for el in elements {
        conn.execute(
            "INSERT INTO schema_elements (id, schema_id, position, key, datatype, nullable)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                el.id,
                el.schema_id,
                el.position,
                el.key,
                el.datatype.to_string(),
                el.nullable,
            ],
        )?;
    }
    Ok(())
}

pub(crate) fn list_schema_elements_on_conn(
    conn: &Connection,
    schema_id: &str,
) -> Result<Vec<SchemaElement>> {
    let mut stmt = conn.prepare(
        "SELECT id, schema_id, position, key, datatype, nullable
         FROM schema_elements WHERE schema_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![schema_id], scan_schema_element)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn scan_schema(row: &rusqlite::Row) -> rusqlite::Result<Schema> {
    let created_at: String = row.get(2)?;
    Ok(Schema {
        id: row.get(0)?,
        hash: row.get(1)?,
        created_at: parse_datetime(&created_at),
    })
}

fn scan_schema_element(row: &rusqlite::Row) -> rusqlite::Result<SchemaElement> {
    let datatype: String = row.get(4)?;
    Ok(SchemaElement {
        id: row.get(0)?,
        schema_id: row.get(1)?,
        position: row.get(2)?,
        key: row.get(3)?,
        datatype: datatype.parse::<DataType>().unwrap_or(DataType::String),
        nullable: row.get(5)?,
    })
}

pub(crate) fn parse_datetime(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

impl SqliteRepository {
    pub fn find_schema_by_hash_impl(&self, hash: &str) -> Result<Option<Schema>> {
        let conn = self.lock_conn()?;
        find_schema_by_hash_on_conn(&conn, hash)
    }

    pub fn create_schema_impl(&self, schema: &Schema, elements: &[SchemaElement]) -> Result<()> {
        let conn = self.lock_conn()?;
        create_schema_on_conn(&conn, schema, elements)
    }

    pub fn list_schema_elements_impl(&self, schema_id: &str) -> Result<Vec<SchemaElement>> {
        let conn = self.lock_conn()?;
        list_schema_elements_on_conn(&conn, schema_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_find_schema_by_hash() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let schema = Schema::new("deadbeef".into());
        let el = SchemaElement::new(&schema.id, 0, "name".into(), DataType::String, false);
        repo.create_schema_impl(&schema, &[el]).unwrap();

        let found = repo.find_schema_by_hash_impl("deadbeef").unwrap().unwrap();
        assert_eq!(found.id, schema.id);

        let elements = repo.list_schema_elements_impl(&schema.id).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].key, "name");
    }

    #[test]
    fn find_schema_by_hash_missing_is_none() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        assert!(repo.find_schema_by_hash_impl("nope").unwrap().is_none());
    }
}
