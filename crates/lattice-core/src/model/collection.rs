//! Collections: named buckets of documents with their own validation and
//! indexing policy (§3).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Policy controlling whether/how documents are validated on ingest (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    None,
    Strict,
    Flexible,
    Partial,
}

impl Default for EnforcementMode {
    fn default() -> Self {
        EnforcementMode::None
    }
}

impl std::str::FromStr for EnforcementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(EnforcementMode::None),
            "strict" => Ok(EnforcementMode::Strict),
            "flexible" => Ok(EnforcementMode::Flexible),
            "partial" => Ok(EnforcementMode::Partial),
            other => Err(format!("unknown enforcement mode: {other:?}")),
        }
    }
}

impl std::fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnforcementMode::None => "none",
            EnforcementMode::Strict => "strict",
            EnforcementMode::Flexible => "flexible",
            EnforcementMode::Partial => "partial",
        };
        f.write_str(s)
    }
}

/// Policy controlling which paths are indexed on ingest (§4.8 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    All,
    Selective,
    None,
}

impl Default for IndexingMode {
    fn default() -> Self {
        IndexingMode::All
    }
}

impl std::str::FromStr for IndexingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(IndexingMode::All),
            "selective" => Ok(IndexingMode::Selective),
            "none" => Ok(IndexingMode::None),
            other => Err(format!("unknown indexing mode: {other:?}")),
        }
    }
}

impl std::fmt::Display for IndexingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IndexingMode::All => "all",
            IndexingMode::Selective => "selective",
            IndexingMode::None => "none",
        };
        f.write_str(s)
    }
}

/// A named bucket of documents with its own validation/indexing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub documents_directory: PathBuf,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub schema_enforcement_mode: EnforcementMode,
    #[serde(default)]
    pub indexing_mode: IndexingMode,
}

impl Collection {
    /// Builds a new collection with freshly generated id and timestamps.
    pub fn new(name: impl Into<String>, documents_directory: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::COLLECTION),
            name: name.into(),
            description: None,
            documents_directory,
            labels: Vec::new(),
            tags: HashMap::new(),
            created_at: now,
            updated_at: now,
            schema_enforcement_mode: EnforcementMode::None,
            indexing_mode: IndexingMode::All,
        }
    }

    /// Path of a document's body file within this collection's directory.
    pub fn document_path(&self, document_id: &str) -> PathBuf {
        self.documents_directory.join(format!("{document_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_collection_defaults() {
        let c = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        assert!(c.id.starts_with("col_"));
        assert_eq!(c.schema_enforcement_mode, EnforcementMode::None);
        assert_eq!(c.indexing_mode, IndexingMode::All);
    }

    #[test]
    fn document_path_uses_id() {
        let c = Collection::new("widgets", PathBuf::from("/data/widgets"));
        let p = c.document_path("doc_abc");
        assert_eq!(p, PathBuf::from("/data/widgets/doc_abc.json"));
    }

    #[test]
    fn enforcement_mode_round_trip() {
        for m in [
            EnforcementMode::None,
            EnforcementMode::Strict,
            EnforcementMode::Flexible,
            EnforcementMode::Partial,
        ] {
            let s = m.to_string();
            let back: EnforcementMode = s.parse().unwrap();
            assert_eq!(m, back);
        }
    }
}
