//! Field constraints, enforced by the schema validator (§4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// A declared constraint on one field path within a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConstraint {
    pub id: String,
    pub collection_id: String,
    pub field_path: String,
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub regex_pattern: Option<String>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub min_length: Option<i64>,
    #[serde(default)]
    pub max_length: Option<i64>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub array_element_type: Option<DataType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldConstraint {
    pub fn new(collection_id: &str, field_path: impl Into<String>, data_type: DataType) -> Self {
        let now = Utc::now();
        Self {
            id: crate::idgen::generate_id(crate::idgen::prefix::FIELD_CONSTRAINT),
            collection_id: collection_id.to_string(),
            field_path: field_path.into(),
            data_type,
            required: false,
            nullable: true,
            regex_pattern: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            allowed_values: None,
            array_element_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn required(mut self, v: bool) -> Self {
        self.required = v;
        self
    }

    pub fn nullable(mut self, v: bool) -> Self {
        self.nullable = v;
        self
    }
}
