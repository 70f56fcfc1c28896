//! Schemas and schema elements (§3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// A canonical, fingerprinted set of `(path, datatype)` elements shared
/// across every document whose extracted element set hashes the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

impl Schema {
    pub fn new(hash: String) -> Self {
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::SCHEMA),
            hash,
            created_at: Utc::now(),
        }
    }
}

/// One leaf (or array-of-object container) entry within a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaElement {
    pub id: String,
    pub schema_id: String,
    pub position: i32,
    pub key: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl SchemaElement {
    pub fn new(schema_id: &str, position: i32, key: String, datatype: DataType, nullable: bool) -> Self {
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::SCHEMA_ELEMENT),
            schema_id: schema_id.to_string(),
            position,
            key,
            datatype,
            nullable,
        }
    }
}
