//! Documents (§3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single ingested JSON document's metadata. The body itself lives on
/// disk at `<collection.documentsDirectory>/<id>.json` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub collection_id: String,
    pub schema_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content_length: u64,
    pub sha256: String,
}

impl Document {
    pub fn new(collection_id: &str, schema_id: &str, content_length: u64, sha256: String) -> Self {
        let now = Utc::now();
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::DOCUMENT),
            collection_id: collection_id.to_string(),
            schema_id: schema_id.to_string(),
            name: None,
            labels: Vec::new(),
            tags: HashMap::new(),
            created_at: now,
            updated_at: now,
            content_length,
            sha256,
        }
    }
}
