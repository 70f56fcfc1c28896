//! Label and tag persistence. Labels attach to documents only; tags attach
//! to either a collection or a document, never both.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::sqlite::store::SqliteRepository;
use crate::traits::TagOwner;

/// Borrowed counterpart of [`TagOwner`], used internally so callers within
/// this module don't need to allocate an owned `String` just to look up tags.
pub(crate) enum TagOwnerRef<'a> {
    Collection(&'a str),
    Document(&'a str),
}

impl<'a> From<&'a TagOwner> for TagOwnerRef<'a> {
    fn from(owner: &'a TagOwner) -> Self {
        match owner {
            TagOwner::Collection(id) => TagOwnerRef::Collection(id),
            TagOwner::Document(id) => TagOwnerRef::Document(id),
        }
    }
}

pub(crate) fn add_label_on_conn(conn: &Connection, document_id: &str, label: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO labels (document_id, label) VALUES (?1, ?2)",
        params![document_id, label],
    )?;
    Ok(())
}

pub(crate) fn get_labels_on_conn(conn: &Connection, document_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT label FROM labels WHERE document_id = ?1 ORDER BY label")?;
    let rows = stmt.query_map(params![document_id], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(crate) fn add_tag_on_conn(
    conn: &Connection,
    owner: TagOwnerRef,
    key: &str,
    value: &str,
) -> Result<()> {
    match owner {
        TagOwnerRef::Collection(id) => {
            conn.execute(
                "INSERT INTO tags (collection_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(collection_id, key) WHERE collection_id IS NOT NULL
                 DO UPDATE SET value = excluded.value",
                params![id, key, value],
            )?;
        }
        TagOwnerRef::Document(id) => {
            conn.execute(
                "INSERT INTO tags (document_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(document_id, key) WHERE document_id IS NOT NULL
                 DO UPDATE SET value = excluded.value",
                params![id, key, value],
            )?;
        }
    }
    Ok(())
}

pub(crate) fn get_tags_on_conn(
    conn: &Connection,
    owner: TagOwnerRef,
) -> Result<HashMap<String, String>> {
    let (sql, id): (&str, &str) = match owner {
        TagOwnerRef::Collection(id) => ("SELECT key, value FROM tags WHERE collection_id = ?1", id),
        TagOwnerRef::Document(id) => ("SELECT key, value FROM tags WHERE document_id = ?1", id),
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut out = HashMap::new();
    for row in rows {
        let (k, v) = row?;
        out.insert(k, v);
    }
    Ok(out)
}

pub(crate) fn documents_with_labels_on_conn(
    conn: &Connection,
    collection_id: &str,
    labels: &[String],
) -> Result<HashSet<String>> {
    if labels.is_empty() {
        return Ok(HashSet::new());
    }
    let mut result: Option<HashSet<String>> = None;
    for label in labels {
        let mut stmt = conn.prepare(
            "SELECT l.document_id FROM labels l
             JOIN documents d ON d.id = l.document_id
             WHERE d.collection_id = ?1 AND l.label = ?2",
        )?;
        let rows = stmt.query_map(params![collection_id, label], |row| row.get::<_, String>(0))?;
        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        result = Some(match result {
            None => ids,
            Some(acc) => acc.intersection(&ids).cloned().collect(),
        });
    }
    Ok(result.unwrap_or_default())
}

pub(crate) fn documents_with_tags_on_conn(
    conn: &Connection,
    collection_id: &str,
    tags: &HashMap<String, String>,
) -> Result<HashSet<String>> {
    if tags.is_empty() {
        return Ok(HashSet::new());
    }
    let mut result: Option<HashSet<String>> = None;
    for (key, value) in tags {
        let mut stmt = conn.prepare(
            "SELECT t.document_id FROM tags t
             JOIN documents d ON d.id = t.document_id
             WHERE d.collection_id = ?1 AND t.key = ?2 AND t.value = ?3",
        )?;
        let rows = stmt.query_map(params![collection_id, key, value], |row| {
            row.get::<_, String>(0)
        })?;
        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        result = Some(match result {
            None => ids,
            Some(acc) => acc.intersection(&ids).cloned().collect(),
        });
    }
    Ok(result.unwrap_or_default())
}

impl SqliteRepository {
    pub fn add_label_impl(&self, document_id: &str, label: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        add_label_on_conn(&conn, document_id, label)
    }

    pub fn get_labels_impl(&self, document_id: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        get_labels_on_conn(&conn, document_id)
    }

    pub fn add_tag_impl(&self, owner: TagOwner, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        add_tag_on_conn(&conn, (&owner).into(), key, value)
    }

    pub fn get_tags_impl(&self, owner: TagOwner) -> Result<HashMap<String, String>> {
        let conn = self.lock_conn()?;
        get_tags_on_conn(&conn, (&owner).into())
    }

    pub fn documents_with_labels_impl(
        &self,
        collection_id: &str,
        labels: &[String],
    ) -> Result<HashSet<String>> {
        let conn = self.lock_conn()?;
        documents_with_labels_on_conn(&conn, collection_id, labels)
    }

    pub fn documents_with_tags_impl(
        &self,
        collection_id: &str,
        tags: &HashMap<String, String>,
    ) -> Result<HashSet<String>> {
        let conn = self.lock_conn()?;
        documents_with_tags_on_conn(&conn, collection_id, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::model::{Collection, Document, Schema};
    use std::path::PathBuf;

    fn setup() -> (SqliteRepository, Document) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let collection = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        repo.create_collection_impl(&collection).unwrap();
        let schema = Schema::new("h".into());
        repo.create_schema_impl(&schema, &[]).unwrap();
        let doc = Document::new(&collection.id, &schema.id, 10, "sha".into());
        repo.create_document_impl(&doc).unwrap();
        (repo, doc)
    }

    #[test]
    fn add_label_is_idempotent() {
        let (repo, doc) = setup();
        repo.add_label_impl(&doc.id, "urgent").unwrap();
        repo.add_label_impl(&doc.id, "urgent").unwrap();
        assert_eq!(repo.get_labels_impl(&doc.id).unwrap(), vec!["urgent"]);
    }

    #[test]
    fn tag_upsert_overwrites_value() {
        let (repo, doc) = setup();
        repo.add_tag_impl(TagOwner::Document(doc.id.clone()), "env", "dev")
            .unwrap();
        repo.add_tag_impl(TagOwner::Document(doc.id.clone()), "env", "prod")
            .unwrap();
        let tags = repo.get_tags_impl(TagOwner::Document(doc.id.clone())).unwrap();
        assert_eq!(tags.get("env"), Some(&"prod".to_string()));
    }

    #[test]
    fn documents_with_labels_intersects() {
        let (repo, doc) = setup();
        repo.add_label_impl(&doc.id, "a").unwrap();
        repo.add_label_impl(&doc.id, "b").unwrap();
        let found = repo
            .documents_with_labels_impl(&doc.collection_id, &["a".into(), "b".into()])
            .unwrap();
        assert!(found.contains(&doc.id));

        let none = repo
            .documents_with_labels_impl(&doc.collection_id, &["a".into(), "c".into()])
            .unwrap();
        assert!(!none.contains(&doc.id));
    }
}
