//! Index-table mappings and the indexed-value rows they contain (§3, §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::index_table_name;

/// Maps a field path to the physical `idx_<md5(path)>` table that stores
/// its values. Global across all collections: a path observed anywhere
/// reuses the same physical table (§3 invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexTableMapping {
    pub id: String,
    pub path: String,
    pub table_name: String,
    pub created_at: DateTime<Utc>,
}

impl IndexTableMapping {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let table_name = index_table_name(&path);
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::INDEX_TABLE_MAPPING),
            path,
            table_name,
            created_at: Utc::now(),
        }
    }
}

/// One value row in a per-path index table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedValue {
    pub id: String,
    pub document_id: String,
    /// Non-null iff the value originated from an array element.
    pub position: Option<i64>,
    /// `None` encodes a JSON `null` leaf.
    pub value: Option<String>,
}

impl IndexedValue {
    pub fn new(document_id: impl Into<String>, position: Option<i64>, value: Option<String>) -> Self {
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::INDEXED_VALUE),
            document_id: document_id.into(),
            position,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_derives_table_name_from_path() {
        let m = IndexTableMapping::new("email");
        assert_eq!(m.table_name, index_table_name("email"));
        assert!(m.table_name.starts_with("idx_"));
    }
}
