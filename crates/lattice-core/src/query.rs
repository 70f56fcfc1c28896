//! Structured query types shared between the SQL-dialect parser and callers
//! that build a query programmatically (§4.7).

use std::collections::HashMap;

use crate::model::document::Document;

/// A comparison operator applied to one index-table's `value` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
    IsNotNull,
    Contains,
    StartsWith,
    EndsWith,
}

/// One predicate over a single field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub condition: Condition,
    pub value: Option<String>,
}

/// Ordering vocabulary (§6): `CreatedUtc` is the default key, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    CreatedUtc,
    LastUpdateUtc,
    Name,
}

impl Default for OrderKey {
    fn default() -> Self {
        OrderKey::CreatedUtc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// The implied default direction for a given key: descending for
    /// timestamps, ascending for name (§6).
    pub fn default_for(key: OrderKey) -> Self {
        match key {
            OrderKey::CreatedUtc | OrderKey::LastUpdateUtc => OrderDirection::Desc,
            OrderKey::Name => OrderDirection::Asc,
        }
    }
}

/// A fully-resolved query, whether parsed from SQL text or built directly.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub collection_id: String,
    pub filters: Vec<Filter>,
    pub labels: Vec<String>,
    pub tags: HashMap<String, String>,
    pub order_by: OrderKey,
    pub order_dir: OrderDirection,
    pub max_results: i64,
    pub skip: i64,
    pub include_content: bool,
    pub include_labels: bool,
    pub include_tags: bool,
}

impl SearchQuery {
    /// Builds an otherwise-empty query against one collection, matching
    /// every document, using the ordering defaults from §6.
    pub fn for_collection(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            filters: Vec::new(),
            labels: Vec::new(),
            tags: HashMap::new(),
            order_by: OrderKey::CreatedUtc,
            order_dir: OrderDirection::default_for(OrderKey::CreatedUtc),
            max_results: 100,
            skip: 0,
            include_content: false,
            include_labels: false,
            include_tags: false,
        }
    }
}

/// Outcome of running a [`SearchQuery`] through the planner.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub success: bool,
    pub documents: Vec<Document>,
    pub total_records: i64,
    pub records_remaining: i64,
    pub end_of_results: bool,
    pub continuation_token: Option<String>,
}

impl QueryResult {
    /// Builds a result, deriving `end_of_results` from `skip + documents.len() >= total`
    /// per §4.7.
    pub fn new(documents: Vec<Document>, total_records: i64, skip: i64) -> Self {
        let returned = documents.len() as i64;
        let end_of_results = skip + returned >= total_records;
        let records_remaining = (total_records - skip - returned).max(0);
        Self {
            success: true,
            documents,
            total_records,
            records_remaining,
            end_of_results,
            continuation_token: None,
        }
    }
}
